//! Alipay open-platform gateway signing: request canonicalization and RSA
//! signatures, response verification, certificate serial fingerprints and
//! AES payload encryption.
//!
//! Transport is the caller's responsibility. This library produces the
//! signed parameter map and checks the raw response text it is handed.

pub mod cert;
pub mod common;
pub mod config;
pub mod crypto;
pub mod request;
pub mod response;
pub mod task;
pub mod types;

pub use cert::{cert_sn, get_sn, get_sn_from_path, public_key_from_cert, root_cert_sn};
pub use common::{Error, Result};
pub use config::{SigningConfig, SigningConfigBuilder};
pub use crypto::{aes_decrypt, aes_encrypt, format_key};
pub use request::{sign_content, sign_request, RequestParams, SignedEnvelope};
pub use response::{
    check_response_sign, extract_signed_content, parse_response, response_key, verify_response,
    GatewayResponse,
};
pub use types::{KeyType, SignType};
