//! Inbound response verification and decoding.

pub mod parse;
pub mod verify;

pub use parse::{parse_response, GatewayResponse};
pub use verify::{check_response_sign, extract_signed_content, response_key, verify_response};
