//! Decryption support for RPF2 resource containers.
//!
//! This crate provides:
//! - Access token deobfuscation (base64 framing, XOR unmasking)
//! - HMAC-SHA256 per-target key derivation from a shared key seed
//! - ChaCha20 stream cipher with the legacy 64-bit nonce

pub mod chacha;
pub mod error;
pub mod kdf;
pub mod token;

pub use error::CryptoError;
pub use kdf::{derive_key, DERIVED_KEY_LEN, PRIMARY_ASSET_NAME};
pub use token::{deobfuscate_token, TokenMaterial, IV_LEN};

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
