use serde_json::Value;

use crate::common::error::{Error, Result};
use crate::config::SigningConfig;
use crate::crypto::cipher::aes_decrypt;

use super::verify::response_key;

pub const SUCCESS_CODE: &str = "10000";

/// Decoded `<method>_response` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// Response object, decrypted when the gateway returned ciphertext.
    pub payload: Value,
    pub sign: Option<String>,
    pub code: Option<String>,
    pub msg: Option<String>,
    pub sub_code: Option<String>,
    pub sub_msg: Option<String>,
}

impl GatewayResponse {
    /// `code` is `10000` and no `sub_code` is present.
    pub fn is_success(&self) -> bool {
        self.code.as_deref() == Some(SUCCESS_CODE) && self.sub_code.is_none()
    }
}

fn field(payload: &Value, name: &str) -> Option<String> {
    match payload.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Extract and decode the payload for `method` from a raw response body.
///
/// A string payload is treated as AES ciphertext when the config carries an
/// encryption key.
pub fn parse_response(raw: &str, method: &str, config: &SigningConfig) -> Result<GatewayResponse> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {}", e)))?;
    let key = response_key(method);
    let payload = body
        .get(&key)
        .cloned()
        .ok_or_else(|| Error::MalformedResponse(format!("missing {}", key)))?;

    let payload = match (payload, config.encrypt_key()) {
        (Value::String(ciphertext), Some(aes_key)) => aes_decrypt(&ciphertext, aes_key)?,
        (payload, _) => payload,
    };

    let response = GatewayResponse {
        code: field(&payload, "code"),
        msg: field(&payload, "msg"),
        sub_code: field(&payload, "sub_code"),
        sub_msg: field(&payload, "sub_msg"),
        sign: body.get("sign").and_then(Value::as_str).map(str::to_string),
        payload,
    };
    if let Some(sub_code) = response.sub_code.as_deref() {
        tracing::debug!(method, sub_code, "gateway returned business error");
    }
    Ok(response)
}
