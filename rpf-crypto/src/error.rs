//! Error types for rpf-crypto operations.

use thiserror::Error;

/// Errors that can occur during crypto operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Token is not valid base64.
    #[error("token is not valid base64: {0}")]
    TokenDecode(#[from] base64::DecodeError),

    /// Token decoded to fewer bytes than the fixed framing requires.
    #[error("token too short: expected at least {expected} bytes, got {actual}")]
    TokenTooShort { expected: usize, actual: usize },

    /// Decryption failed.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
