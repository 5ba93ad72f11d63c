//! Shared infrastructure: the crate error type and charset handling.

pub mod charset;
pub mod error;

pub use error::{Error, Result};
