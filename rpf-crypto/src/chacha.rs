//! ChaCha20 stream cipher for resource decryption.
//!
//! Resources are encrypted with ChaCha20 using the original 64-bit nonce
//! (the "legacy" variant). The 8-byte IV recovered from the access token is
//! the cipher's native nonce, used directly. There is no authentication
//! tag: a wrong key or IV silently produces garbage.

use chacha20::ChaCha20Legacy;
use cipher::{KeyIvInit, StreamCipher};

use crate::{CryptoError, Result};

/// Create the resource ChaCha20 stream cipher.
pub fn init_chacha20(key: &[u8; 32], iv: &[u8; 8]) -> ChaCha20Legacy {
    ChaCha20Legacy::new(key.into(), iv.into())
}

/// Decrypt an in-memory buffer in-place.
///
/// Keystream output has the same length as the input; there is no padding.
pub fn decrypt_chacha20(data: &mut [u8], key: &[u8; 32], iv: &[u8; 8]) -> Result<()> {
    let mut cipher = init_chacha20(key, iv);
    cipher
        .try_apply_keystream(data)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    Ok(())
}

/// Encrypt an in-memory buffer in-place.
///
/// Uses the same keystream as [decrypt][decrypt_chacha20] (stream ciphers
/// are symmetric).
pub fn encrypt_chacha20(data: &mut [u8], key: &[u8; 32], iv: &[u8; 8]) -> Result<()> {
    decrypt_chacha20(data, key, iv)
}
