//! Certificate identities for the gateway's certificate mode.
//!
//! Requests carry `app_cert_sn`, `alipay_cert_sn` and `alipay_root_cert_sn`,
//! derived from certificates with a gateway-specific formula (see
//! [`CertificateRecord::fingerprint`]). This is a fingerprinting convention,
//! not X.509 validation: nothing here checks chains, expiry or revocation.

mod record;

pub use record::{CertificateRecord, RSA_SIGNATURE_OID_PREFIX};

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::common::error::{Error, Result};

/// Fingerprint of the first certificate in `content`.
pub fn cert_sn(content: impl AsRef<[u8]>) -> Result<String> {
    let content = non_empty(content.as_ref())?;
    CertificateRecord::from_pem(content)?.fingerprint()
}

/// Fingerprint of a root bundle: the fingerprints of every RSA-signed
/// certificate, in bundle order, joined with `_`.
///
/// Certificates signed with other algorithms are skipped. A bundle with no
/// RSA-signed certificate yields an empty string.
pub fn root_cert_sn(content: impl AsRef<[u8]>) -> Result<String> {
    let content = non_empty(content.as_ref())?;
    let records = CertificateRecord::all_from_pem(content)?;

    let mut fingerprints = Vec::new();
    let mut skipped = 0usize;
    for record in &records {
        if record.is_rsa_signed() {
            fingerprints.push(record.fingerprint()?);
        } else {
            skipped += 1;
        }
    }

    if fingerprints.is_empty() {
        tracing::warn!(
            certificates = records.len(),
            "root bundle has no RSA-signed certificate; root serial is empty"
        );
    } else if skipped > 0 {
        tracing::debug!(skipped, "skipped non-RSA certificates in root bundle");
    }

    Ok(fingerprints.join("_"))
}

/// Serial fingerprint of a certificate (`is_root == false`) or root bundle.
pub fn get_sn(content: impl AsRef<[u8]>, is_root: bool) -> Result<String> {
    if is_root {
        root_cert_sn(content)
    } else {
        cert_sn(content)
    }
}

/// [`get_sn`] over a certificate file.
pub fn get_sn_from_path(path: Option<&Path>, is_root: bool) -> Result<String> {
    let content = read_path(path)?;
    get_sn(content, is_root)
}

/// Base64 SubjectPublicKeyInfo of the first certificate in `content`.
///
/// Wrap with [`crate::crypto::format_key`] and `PUBLIC KEY` to get a PEM key.
pub fn public_key_from_cert(content: impl AsRef<[u8]>) -> Result<String> {
    let content = non_empty(content.as_ref())?;
    let record = CertificateRecord::from_pem(content)?;
    Ok(BASE64.encode(record.public_key_der))
}

/// [`public_key_from_cert`] over a certificate file.
pub fn public_key_from_cert_path(path: Option<&Path>) -> Result<String> {
    let content = read_path(path)?;
    public_key_from_cert(content)
}

fn non_empty(content: &[u8]) -> Result<&[u8]> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::Config("empty certificate content".into()));
    }
    Ok(content)
}

fn read_path(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) if !p.as_os_str().is_empty() => Ok(std::fs::read(p)?),
        _ => Err(Error::Config("empty file path".into())),
    }
}
