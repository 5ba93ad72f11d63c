//! Canonical parameter string construction.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::common::charset;
use crate::common::error::{Error, Result};
use crate::config::SigningConfig;
use crate::crypto::cipher::aes_encrypt;

pub const BIZ_CONTENT: &str = "biz_content";
pub const ENCRYPT_TYPE: &str = "encrypt_type";
pub const AES: &str = "AES";

/// Caller-supplied parameters for one gateway call.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    /// Business payload, serialized into `biz_content`.
    pub biz_content: Option<Value>,
    /// AES-encrypt the business payload with the configured key.
    pub need_encrypt: bool,
    /// Additional top-level parameters such as `notifyUrl`.
    pub extra: Map<String, Value>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn biz_content(mut self, content: Value) -> Self {
        self.biz_content = Some(content);
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.need_encrypt = true;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Parameters in wire form: snake_case names, string values, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    params: BTreeMap<String, String>,
    content: String,
    bytes: Vec<u8>,
}

impl CanonicalRequest {
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The `k=v&k=v` text that gets signed.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// `content` encoded in the configured charset.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<String, String>, String, Vec<u8>) {
        (self.params, self.content, self.bytes)
    }
}

/// Convert a camelCase or PascalCase name to snake_case.
///
/// Names already in snake_case pass through unchanged. A run of capitals is
/// kept together as one word: `HTTPServer` becomes `http_server`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Snake-case the top-level keys of an object. Nested values and non-object
/// payloads are left as they are.
pub fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (to_snake_case(&k), v))
                .collect(),
        ),
        other => other,
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Build the sorted wire parameters for `method` (without `sign`).
///
/// `method` itself is one of the parameters, so it is covered by the
/// signature alongside `app_id`, `charset`, `version` and `sign_type`.
pub fn canonical_params(
    method: &str,
    params: &RequestParams,
    config: &SigningConfig,
) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();

    for (name, value) in &params.extra {
        out.insert(to_snake_case(name), stringify(value.clone()));
    }

    out.insert("method".to_string(), method.to_string());
    out.insert("app_id".to_string(), config.app_id().to_string());
    out.insert("charset".to_string(), config.charset().to_string());
    out.insert("version".to_string(), config.version().to_string());
    out.insert("sign_type".to_string(), config.sign_type().as_str().to_string());

    let optional = [
        ("app_cert_sn", config.app_cert_sn()),
        ("alipay_cert_sn", config.alipay_cert_sn()),
        ("alipay_root_cert_sn", config.alipay_root_cert_sn()),
        ("ws_service_url", config.ws_service_url()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            out.insert(name.to_string(), value.to_string());
        }
    }

    if let Some(content) = params.biz_content.clone() {
        let content = snake_case_keys(content);
        if params.need_encrypt {
            let key = config.encrypt_key().ok_or(Error::EncryptKeyRequired)?;
            out.insert(BIZ_CONTENT.to_string(), aes_encrypt(&content, key)?);
            out.insert(ENCRYPT_TYPE.to_string(), AES.to_string());
        } else {
            out.insert(BIZ_CONTENT.to_string(), stringify(content));
        }
    }

    Ok(out)
}

/// Join sorted parameters as `k=v&k=v`. No URL-encoding is applied.
pub fn join_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonicalize a request into its wire parameters and signable bytes.
pub fn canonicalize(
    method: &str,
    params: &RequestParams,
    config: &SigningConfig,
) -> Result<CanonicalRequest> {
    let params = canonical_params(method, params, config)?;
    let content = join_params(&params);
    let bytes = charset::encode(&content, config.encoding())?;
    Ok(CanonicalRequest {
        params,
        content,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::aes_decrypt;
    use serde_json::json;

    const PKCS1_PEM: &str = include_str!("../../tests/fixtures/rsa2048_pkcs1.pem");
    const AES_KEY: &str = "aa4BtZ4tspm2wnXLb1ThQA==";

    fn config() -> SigningConfig {
        SigningConfig::builder("2021000000000000", PKCS1_PEM)
            .build()
            .unwrap()
    }

    // ─── snake_case ──────────────────────────────────────────────────

    #[test]
    fn snake_case_conversions() {
        assert_eq!(to_snake_case("appId"), "app_id");
        assert_eq!(to_snake_case("outTradeNo"), "out_trade_no");
        assert_eq!(to_snake_case("notifyUrl"), "notify_url");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("alipayRootCertSn"), "alipay_root_cert_sn");
        assert_eq!(to_snake_case("field2Name"), "field2_name");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn snake_case_keys_is_one_level() {
        let value = snake_case_keys(json!({
            "outTradeNo": "T1",
            "goodsDetail": {"goodsId": "G1"}
        }));
        assert_eq!(value["out_trade_no"], "T1");
        assert_eq!(value["goods_detail"]["goodsId"], "G1");
    }

    // ─── Canonical parameters ────────────────────────────────────────

    #[test]
    fn common_fields_present() {
        let params = canonical_params("alipay.trade.query", &RequestParams::new(), &config()).unwrap();
        assert_eq!(params["method"], "alipay.trade.query");
        let canonical = canonicalize("alipay.trade.query", &RequestParams::new(), &config()).unwrap();
        assert!(canonical.content().contains("&method=alipay.trade.query&"));
        assert_eq!(params["app_id"], "2021000000000000");
        assert_eq!(params["charset"], "utf-8");
        assert_eq!(params["version"], "1.0");
        assert_eq!(params["sign_type"], "RSA2");
        assert!(!params.contains_key("app_cert_sn"));
        assert!(!params.contains_key("ws_service_url"));
        assert!(!params.contains_key(BIZ_CONTENT));
    }

    #[test]
    fn optional_fields_when_set() {
        let config = SigningConfig::builder("2021", PKCS1_PEM)
            .app_cert_sn("a1")
            .alipay_cert_sn("b2")
            .alipay_root_cert_sn("c3_d4")
            .ws_service_url("wss://example.test")
            .build()
            .unwrap();
        let params = canonical_params("m", &RequestParams::new(), &config).unwrap();
        assert_eq!(params["app_cert_sn"], "a1");
        assert_eq!(params["alipay_cert_sn"], "b2");
        assert_eq!(params["alipay_root_cert_sn"], "c3_d4");
        assert_eq!(params["ws_service_url"], "wss://example.test");
    }

    #[test]
    fn extra_params_snake_cased_and_stringified() {
        let request = RequestParams::new()
            .param("notifyUrl", "https://example.test/notify")
            .param("timeoutExpress", 30)
            .param("isAsync", true)
            .param("extendParams", json!({"sysServiceProviderId": "P1"}))
            .param("nothing", Value::Null);
        let params = canonical_params("m", &request, &config()).unwrap();
        assert_eq!(params["notify_url"], "https://example.test/notify");
        assert_eq!(params["timeout_express"], "30");
        assert_eq!(params["is_async"], "true");
        assert_eq!(params["extend_params"], r#"{"sysServiceProviderId":"P1"}"#);
        assert_eq!(params["nothing"], "null");
    }

    #[test]
    fn config_fields_override_extra() {
        let request = RequestParams::new().param("appId", "spoofed");
        let params = canonical_params("m", &request, &config()).unwrap();
        assert_eq!(params["app_id"], "2021000000000000");
    }

    #[test]
    fn order_is_independent_of_insertion() {
        let a = RequestParams::new().param("zeta", "1").param("alpha", "2");
        let b = RequestParams::new().param("alpha", "2").param("zeta", "1");
        let config = config();
        let a = canonicalize("m", &a, &config).unwrap();
        let b = canonicalize("m", &b, &config).unwrap();
        assert_eq!(a.content(), b.content());

        let keys: Vec<&String> = a.params().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    // ─── Business content ────────────────────────────────────────────

    #[test]
    fn biz_content_plain() {
        let request = RequestParams::new().biz_content(json!({"outTradeNo": "T1"}));
        let canonical = canonicalize("alipay.trade.pay", &request, &config()).unwrap();
        assert_eq!(canonical.params()[BIZ_CONTENT], r#"{"out_trade_no":"T1"}"#);
        assert!(canonical.content().contains(r#"biz_content={"out_trade_no":"T1"}"#));
        assert!(!canonical.params().contains_key(ENCRYPT_TYPE));
    }

    #[test]
    fn biz_content_encrypted() {
        let config = SigningConfig::builder("2021", PKCS1_PEM)
            .encrypt_key(AES_KEY)
            .build()
            .unwrap();
        let request = RequestParams::new()
            .biz_content(json!({"outTradeNo": "T1"}))
            .encrypted();
        let params = canonical_params("m", &request, &config).unwrap();
        assert_eq!(params[ENCRYPT_TYPE], "AES");
        assert_eq!(
            params[BIZ_CONTENT],
            "v9xEJGtFY9vW2Ge//P1+YPAqkjvsnf9Vi3HH1DBqArA="
        );
        assert_eq!(
            aes_decrypt(&params[BIZ_CONTENT], AES_KEY).unwrap(),
            json!({"out_trade_no": "T1"})
        );
    }

    #[test]
    fn encryption_without_key_fails() {
        let request = RequestParams::new().biz_content(json!({"a": 1})).encrypted();
        let err = canonical_params("m", &request, &config()).unwrap_err();
        assert!(matches!(err, Error::EncryptKeyRequired));
    }

    #[test]
    fn encrypt_flag_without_content_is_noop() {
        let request = RequestParams::new().encrypted();
        let params = canonical_params("m", &request, &config()).unwrap();
        assert!(!params.contains_key(ENCRYPT_TYPE));
    }

    // ─── Joining and charset ─────────────────────────────────────────

    #[test]
    fn joined_without_url_encoding() {
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "x y&z".to_string());
        params.insert("a".to_string(), "1".to_string());
        assert_eq!(join_params(&params), "a=1&b=x y&z");
    }

    #[test]
    fn gbk_charset_transcodes_values() {
        let config = SigningConfig::builder("2021", PKCS1_PEM)
            .charset("GBK")
            .build()
            .unwrap();
        let request = RequestParams::new().param("subject", "中文");
        let canonical = canonicalize("m", &request, &config).unwrap();
        assert!(canonical.content().contains("subject=中文"));
        let needle = [b'=', 0xD6, 0xD0, 0xCE, 0xC4];
        assert!(canonical.bytes().windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn utf8_bytes_match_content() {
        let canonical = canonicalize("m", &RequestParams::new(), &config()).unwrap();
        assert_eq!(canonical.bytes(), canonical.content().as_bytes());
    }
}
