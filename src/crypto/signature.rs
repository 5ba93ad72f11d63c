use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature as ring_sig;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};

use super::key::{private_key_der, public_key_pkcs1, PrivateKeyEncoding};
use crate::common::error::{crypto_error, Result};
use crate::types::SignType;

/// Sign `content` with the PEM private key, returning the base64 signature.
///
/// `RSA2` goes through ring. ring refuses to produce SHA-1 signatures, so
/// `RSA` is signed with the `rsa` crate.
pub fn sign(content: &[u8], sign_type: SignType, private_key_pem: &str) -> Result<String> {
    let (encoding, der) = private_key_der(private_key_pem)?;
    let signature = match sign_type {
        SignType::Rsa2 => sign_sha256(content, encoding, &der)?,
        SignType::Rsa => sign_sha1(content, encoding, &der)?,
    };
    Ok(BASE64.encode(signature))
}

fn sign_sha256(content: &[u8], encoding: PrivateKeyEncoding, der: &[u8]) -> Result<Vec<u8>> {
    let key_pair = match encoding {
        PrivateKeyEncoding::Pkcs8 => ring_sig::RsaKeyPair::from_pkcs8(der),
        PrivateKeyEncoding::Pkcs1 => ring_sig::RsaKeyPair::from_der(der),
    }
    .map_err(|e| crypto_error(format!("invalid RSA private key: {}", e)))?;

    let rng = SystemRandom::new();
    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(&ring_sig::RSA_PKCS1_SHA256, &rng, content, &mut signature)
        .map_err(|e| crypto_error(format!("RSA signing failed: {}", e)))?;
    Ok(signature)
}

fn sign_sha1(content: &[u8], encoding: PrivateKeyEncoding, der: &[u8]) -> Result<Vec<u8>> {
    let key = match encoding {
        PrivateKeyEncoding::Pkcs8 => RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| crypto_error(format!("invalid RSA private key: {}", e)))?,
        PrivateKeyEncoding::Pkcs1 => RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| crypto_error(format!("invalid RSA private key: {}", e)))?,
    };
    let hashed = Sha1::digest(content);
    key.sign(Pkcs1v15Sign::new::<Sha1>(), &hashed)
        .map_err(|e| crypto_error(format!("RSA signing failed: {}", e)))
}

/// Verify a base64 signature over `content`.
///
/// Returns `Ok(false)` for a mismatch or an undecodable signature; an
/// unusable public key is an error.
pub fn verify(
    content: &[u8],
    signature_b64: &str,
    public_key_pem: &str,
    sign_type: SignType,
) -> Result<bool> {
    let public_key = public_key_pkcs1(public_key_pem)?;

    let signature = match BASE64.decode(signature_b64.trim()) {
        Ok(s) => s,
        Err(_) => return Ok(false),
    };

    let (preferred, legacy): (
        &'static dyn ring_sig::VerificationAlgorithm,
        &'static dyn ring_sig::VerificationAlgorithm,
    ) = match sign_type {
        SignType::Rsa => (
            &ring_sig::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            &ring_sig::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
        ),
        SignType::Rsa2 => (
            &ring_sig::RSA_PKCS1_2048_8192_SHA256,
            &ring_sig::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
        ),
    };

    let verified = ring_sig::UnparsedPublicKey::new(preferred, &public_key)
        .verify(content, &signature)
        .or_else(|_| {
            ring_sig::UnparsedPublicKey::new(legacy, &public_key).verify(content, &signature)
        })
        .is_ok();
    Ok(verified)
}
