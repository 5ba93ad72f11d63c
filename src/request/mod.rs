//! Outbound request canonicalization and signing.

pub mod canon;
pub mod sign;

pub use canon::{canonicalize, to_snake_case, CanonicalRequest, RequestParams};
pub use sign::{sign_content, sign_request, SignedEnvelope};
