use std::collections::BTreeMap;

use crate::common::error::Result;
use crate::config::SigningConfig;
use crate::crypto::signature;
use crate::types::SignType;

use super::canon::{canonicalize, RequestParams};

pub const SIGN: &str = "sign";

/// Wire parameters with the computed signature appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    params: BTreeMap<String, String>,
    content: String,
}

impl SignedEnvelope {
    /// All parameters, `sign` included, ready for form encoding.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn sign(&self) -> &str {
        self.params.get(SIGN).map(String::as_str).unwrap_or_default()
    }

    /// The canonical string the signature covers.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_params(self) -> BTreeMap<String, String> {
        self.params
    }
}

/// Sign canonical content bytes, returning the base64 signature.
pub fn sign_content(content: &[u8], sign_type: SignType, private_key_pem: &str) -> Result<String> {
    signature::sign(content, sign_type, private_key_pem)
}

/// Canonicalize and sign a gateway request.
pub fn sign_request(
    method: &str,
    params: &RequestParams,
    config: &SigningConfig,
) -> Result<SignedEnvelope> {
    let (mut wire, content, bytes) = canonicalize(method, params, config)?.into_parts();
    let sign = sign_content(&bytes, config.sign_type(), config.private_key())?;

    tracing::debug!(
        method,
        app_id = config.app_id(),
        sign_type = %config.sign_type(),
        fields = wire.len(),
        "signed gateway request"
    );

    wire.insert(SIGN.to_string(), sign);
    Ok(SignedEnvelope {
        params: wire,
        content,
    })
}
