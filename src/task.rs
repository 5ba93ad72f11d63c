//! Run signing and verification off the async executor.
//!
//! RSA private-key operations take long enough to stall a reactor thread
//! under load; these wrappers move them onto tokio's blocking pool.

use std::sync::Arc;

use crate::common::error::{Error, Result};
use crate::config::SigningConfig;
use crate::request::{sign_request, RequestParams, SignedEnvelope};
use crate::response::verify_response;

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}

/// [`sign_request`] on the blocking pool.
pub async fn sign_request_blocking(
    config: Arc<SigningConfig>,
    method: impl Into<String>,
    params: RequestParams,
) -> Result<SignedEnvelope> {
    let method = method.into();
    run_blocking(move || sign_request(&method, &params, &config)).await
}

/// [`verify_response`] on the blocking pool, using the config's gateway
/// public key.
pub async fn verify_response_blocking(
    config: Arc<SigningConfig>,
    raw: impl Into<String>,
    method: impl Into<String>,
) -> Result<bool> {
    let raw = raw.into();
    let method = method.into();
    run_blocking(move || {
        let public_key = config
            .alipay_public_key()
            .ok_or_else(|| Error::Config("alipayPublicKey is required".into()))?;
        verify_response(&raw, &method, public_key, config.sign_type())
    })
    .await
}
