use serde_json::Value;

use crate::common::error::{Error, Result};
use crate::crypto::signature;
use crate::types::SignType;

const SIGN_MARKER: &str = "\"sign\"";

/// JSON key holding the payload for `method`: `alipay.trade.pay` maps to
/// `alipay_trade_pay_response`.
pub fn response_key(method: &str) -> String {
    format!("{}_response", method.replace('.', "_"))
}

fn malformed(detail: impl Into<String>) -> Error {
    Error::MalformedResponse(detail.into())
}

/// Recover the exact span of `raw` that the gateway signed.
///
/// The payload is cut out of the raw text rather than re-serialized, so
/// whitespace and key order inside it are preserved byte for byte. The span
/// runs from just past `"<key>"` to the last `"sign"`, trimmed to the
/// outermost braces.
pub fn extract_signed_content<'a>(raw: &'a str, key: &str) -> Result<&'a str> {
    let marker = format!("\"{}\"", key);
    let start = raw
        .find(&marker)
        .ok_or_else(|| malformed(format!("missing {}", key)))?
        + marker.len();
    let end = raw
        .rfind(SIGN_MARKER)
        .ok_or_else(|| malformed("missing sign"))?;
    if end <= start {
        return Err(malformed("sign precedes response payload"));
    }

    let span = &raw[start..end];
    let open = span
        .find('{')
        .ok_or_else(|| malformed("response payload is not an object"))?;
    let close = span
        .rfind('}')
        .filter(|&close| close > open)
        .ok_or_else(|| malformed("response payload is not an object"))?;
    Ok(&span[open..=close])
}

fn server_sign(raw: &str) -> Result<String> {
    let body: Value =
        serde_json::from_str(raw).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    body.get("sign")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed("missing sign"))
}

fn verify_with_key(raw: &str, key: &str, public_key_pem: &str, sign_type: SignType) -> Result<bool> {
    if raw.trim().is_empty() {
        return Err(malformed("empty response"));
    }
    let content = extract_signed_content(raw, key)?;
    let sign = server_sign(raw)?;
    signature::verify(content.as_bytes(), &sign, public_key_pem, sign_type)
}

/// Verify a raw gateway response signed under `key`.
///
/// Never fails: empty or malformed input, an unusable key and a signature
/// mismatch all report `false`.
pub fn check_response_sign(
    raw: &str,
    key: &str,
    public_key_pem: &str,
    sign_type: SignType,
) -> bool {
    match verify_with_key(raw, key, public_key_pem, sign_type) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(key, sign_type = %sign_type, "response signature mismatch");
            false
        }
        Err(Error::MalformedResponse(detail)) => {
            tracing::debug!(key, detail = %detail, "response not verifiable");
            false
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "response verification failed");
            false
        }
    }
}

/// Verify the response to `method`, reporting a malformed body as
/// [`Error::MalformedResponse`] rather than `false`.
pub fn verify_response(
    raw: &str,
    method: &str,
    public_key_pem: &str,
    sign_type: SignType,
) -> Result<bool> {
    let key = response_key(method);
    let verified = verify_with_key(raw, &key, public_key_pem, sign_type)?;
    if !verified {
        tracing::warn!(method, sign_type = %sign_type, "response signature mismatch");
    }
    Ok(verified)
}
