//! AES-CBC encryption of JSON business payloads.
//!
//! The gateway uses a fixed all-zero IV. This is part of the wire protocol
//! and must not be randomized.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::common::error::{crypto_error, parse_error, Error, Result};

/// Hex form of the IV: 32 zero digits, 16 zero bytes.
const IV_HEX: &str = "00000000000000000000000000000000";

struct AesKey {
    key: Vec<u8>,
    iv: [u8; 16],
}

fn parse_key(aes_key: &str) -> Result<AesKey> {
    let trimmed = aes_key.trim();
    if trimmed.is_empty() {
        return Err(Error::EncryptKeyRequired);
    }
    let key = BASE64
        .decode(trimmed)
        .map_err(|e| crypto_error(format!("AES key is not valid base64: {}", e)))?;
    let iv: [u8; 16] = hex::decode(IV_HEX)
        .ok()
        .and_then(|v| v.try_into().ok())
        .ok_or_else(|| crypto_error("invalid IV"))?;
    Ok(AesKey { key, iv })
}

/// Serialize `data` as JSON and encrypt it, returning base64 ciphertext.
pub fn aes_encrypt(data: &Value, aes_key: &str) -> Result<String> {
    let AesKey { key, iv } = parse_key(aes_key)?;
    let plaintext = serde_json::to_string(data)
        .map_err(|e| parse_error(format!("JSON serialization failed: {}", e)))?;
    let ciphertext = encrypt_cbc(&key, &iv, plaintext.as_bytes())?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64 ciphertext and parse the UTF-8 plaintext as JSON.
pub fn aes_decrypt(message: &str, aes_key: &str) -> Result<Value> {
    let AesKey { key, iv } = parse_key(aes_key)?;
    let ciphertext = BASE64
        .decode(message.trim())
        .map_err(|e| parse_error(format!("ciphertext is not valid base64: {}", e)))?;
    let plaintext = decrypt_cbc(&key, &iv, &ciphertext)?;
    let text = String::from_utf8(plaintext)
        .map_err(|e| parse_error(format!("plaintext is not UTF-8: {}", e)))?;
    serde_json::from_str(&text).map_err(|e| parse_error(format!("plaintext is not JSON: {}", e)))
}

fn encrypt_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| crypto_error("invalid AES key length");
    match key.len() {
        16 => Ok(cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data)),
        24 => Ok(cbc::Encryptor::<aes::Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data)),
        32 => Ok(cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data)),
        n => Err(crypto_error(format!("invalid AES key length: {} bytes", n))),
    }
}

fn decrypt_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| crypto_error("invalid AES key length");
    let unpad = |_| crypto_error("AES decryption failed: bad padding");
    match key.len() {
        16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(unpad),
        24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(unpad),
        32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(unpad),
        n => Err(crypto_error(format!("invalid AES key length: {} bytes", n))),
    }
}
