//! Signing configuration.
//!
//! A [`SigningConfig`] is assembled once per client and never mutated. It is
//! `Send + Sync`; share it behind an `Arc` across concurrent calls.

use std::fmt;

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::cert::{cert_sn, public_key_from_cert, root_cert_sn};
use crate::common::charset;
use crate::common::error::{Error, Result};
use crate::crypto::key::{format_key, PUBLIC_KEY};
use crate::types::{KeyType, SignType};

pub const DEFAULT_CHARSET: &str = "utf-8";
pub const DEFAULT_VERSION: &str = "1.0";

/// Immutable credentials and protocol settings for one application.
#[derive(Clone)]
pub struct SigningConfig {
    app_id: String,
    charset: String,
    encoding: &'static Encoding,
    version: String,
    sign_type: SignType,
    app_cert_sn: Option<String>,
    alipay_cert_sn: Option<String>,
    alipay_root_cert_sn: Option<String>,
    ws_service_url: Option<String>,
    encrypt_key: Option<String>,
    private_key: String,
    alipay_public_key: Option<String>,
}

impl SigningConfig {
    pub fn builder(app_id: impl Into<String>, private_key: impl Into<String>) -> SigningConfigBuilder {
        SigningConfigBuilder {
            app_id: app_id.into(),
            private_key: private_key.into(),
            ..SigningConfigBuilder::default()
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn sign_type(&self) -> SignType {
        self.sign_type
    }

    pub fn app_cert_sn(&self) -> Option<&str> {
        self.app_cert_sn.as_deref()
    }

    pub fn alipay_cert_sn(&self) -> Option<&str> {
        self.alipay_cert_sn.as_deref()
    }

    pub fn alipay_root_cert_sn(&self) -> Option<&str> {
        self.alipay_root_cert_sn.as_deref()
    }

    pub fn ws_service_url(&self) -> Option<&str> {
        self.ws_service_url.as_deref()
    }

    pub fn encrypt_key(&self) -> Option<&str> {
        self.encrypt_key.as_deref()
    }

    /// Application private key, PEM.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Gateway public key, PEM.
    pub fn alipay_public_key(&self) -> Option<&str> {
        self.alipay_public_key.as_deref()
    }

    /// Whether requests carry certificate serial numbers.
    pub fn is_cert_mode(&self) -> bool {
        self.app_cert_sn.is_some()
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("app_id", &self.app_id)
            .field("charset", &self.charset)
            .field("version", &self.version)
            .field("sign_type", &self.sign_type)
            .field("app_cert_sn", &self.app_cert_sn)
            .field("alipay_cert_sn", &self.alipay_cert_sn)
            .field("alipay_root_cert_sn", &self.alipay_root_cert_sn)
            .field("ws_service_url", &self.ws_service_url)
            .field("encrypt_key", &self.encrypt_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &"<redacted>")
            .field("alipay_public_key", &self.alipay_public_key.is_some())
            .finish()
    }
}

/// Builder for [`SigningConfig`]. Also deserializes from the SDK's camelCase
/// JSON config shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SigningConfigBuilder {
    app_id: String,
    private_key: String,
    key_type: KeyType,
    charset: Option<String>,
    version: Option<String>,
    sign_type: SignType,
    app_cert_sn: Option<String>,
    alipay_cert_sn: Option<String>,
    alipay_root_cert_sn: Option<String>,
    ws_service_url: Option<String>,
    encrypt_key: Option<String>,
    alipay_public_key: Option<String>,
    app_cert_content: Option<String>,
    alipay_public_cert_content: Option<String>,
    alipay_root_cert_content: Option<String>,
}

impl SigningConfigBuilder {
    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn sign_type(mut self, sign_type: SignType) -> Self {
        self.sign_type = sign_type;
        self
    }

    pub fn app_cert_sn(mut self, sn: impl Into<String>) -> Self {
        self.app_cert_sn = Some(sn.into());
        self
    }

    pub fn alipay_cert_sn(mut self, sn: impl Into<String>) -> Self {
        self.alipay_cert_sn = Some(sn.into());
        self
    }

    pub fn alipay_root_cert_sn(mut self, sn: impl Into<String>) -> Self {
        self.alipay_root_cert_sn = Some(sn.into());
        self
    }

    pub fn ws_service_url(mut self, url: impl Into<String>) -> Self {
        self.ws_service_url = Some(url.into());
        self
    }

    /// Base64 AES key for encrypted business content.
    pub fn encrypt_key(mut self, key: impl Into<String>) -> Self {
        self.encrypt_key = Some(key.into());
        self
    }

    /// Gateway public key (bare base64 or PEM) for public-key mode.
    pub fn alipay_public_key(mut self, key: impl Into<String>) -> Self {
        self.alipay_public_key = Some(key.into());
        self
    }

    /// Switch to certificate mode. Serial numbers and the gateway public key
    /// are derived from these PEM documents in [`build`](Self::build),
    /// overriding any explicitly set values.
    pub fn cert_mode(
        mut self,
        app_cert: impl Into<String>,
        alipay_public_cert: impl Into<String>,
        alipay_root_cert: impl Into<String>,
    ) -> Self {
        self.app_cert_content = Some(app_cert.into());
        self.alipay_public_cert_content = Some(alipay_public_cert.into());
        self.alipay_root_cert_content = Some(alipay_root_cert.into());
        self
    }

    pub fn build(self) -> Result<SigningConfig> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("appId is required".into()));
        }
        if self.private_key.trim().is_empty() {
            return Err(Error::Config("privateKey is required".into()));
        }

        let charset = self
            .charset
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string());
        let encoding = charset::resolve(&charset)?;
        let version = self
            .version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let private_key = format_key(&self.private_key, self.key_type.pem_label());

        let mut app_cert_sn = self.app_cert_sn;
        let mut alipay_cert_sn = self.alipay_cert_sn;
        let mut alipay_root_cert_sn = self.alipay_root_cert_sn;
        let mut alipay_public_key = self.alipay_public_key;

        if let Some(app_cert) = self.app_cert_content.as_deref() {
            let public_cert = self.alipay_public_cert_content.as_deref().unwrap_or_default();
            let root_cert = self.alipay_root_cert_content.as_deref().unwrap_or_default();

            app_cert_sn = Some(cert_sn(app_cert)?);
            alipay_cert_sn = Some(cert_sn(public_cert)?);
            alipay_root_cert_sn = Some(root_cert_sn(root_cert)?);
            alipay_public_key = Some(public_key_from_cert(public_cert)?);

            tracing::debug!(
                app_id = %self.app_id,
                app_cert_sn = app_cert_sn.as_deref().unwrap_or_default(),
                "derived certificate serial numbers"
            );
        }

        let alipay_public_key = alipay_public_key
            .filter(|k| !k.trim().is_empty())
            .map(|k| format_key(&k, PUBLIC_KEY));

        Ok(SigningConfig {
            app_id: self.app_id,
            charset,
            encoding,
            version,
            sign_type: self.sign_type,
            app_cert_sn,
            alipay_cert_sn,
            alipay_root_cert_sn,
            ws_service_url: self.ws_service_url,
            encrypt_key: self.encrypt_key.filter(|k| !k.trim().is_empty()),
            private_key,
            alipay_public_key,
        })
    }
}
