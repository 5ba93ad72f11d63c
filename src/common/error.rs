use thiserror::Error;

/// Errors raised while assembling configuration, signing requests or
/// reading gateway material.
///
/// A signature that does not verify is not an error: the verifier reports it
/// as `false` and the caller decides what to do with it.
#[derive(Debug, Error)]
pub enum Error {
    /// Required credential, key or setting missing or unusable.
    #[error("config error: {0}")]
    Config(String),
    /// Malformed PEM, certificate or JSON material.
    #[error("parse error: {0}")]
    Parse(String),
    /// Payload encryption requested without a configured AES key.
    #[error("encryption key required")]
    EncryptKeyRequired,
    #[error("crypto error: {0}")]
    Crypto(String),
    /// Response body lacks the expected `<method>_response` / `sign` shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn parse_error(detail: impl Into<String>) -> Error {
    Error::Parse(detail.into())
}

pub(crate) fn crypto_error(detail: impl Into<String>) -> Error {
    Error::Crypto(detail.into())
}
