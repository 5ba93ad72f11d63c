//! Cryptographic primitives: PEM key handling, RSA signatures and AES
//! payload encryption.

pub mod cipher;
pub mod key;
pub mod signature;

pub use cipher::{aes_decrypt, aes_encrypt};
pub use key::{format_key, PRIVATE_KEY, PUBLIC_KEY, RSA_PRIVATE_KEY};
