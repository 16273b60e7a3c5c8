//! Access token deobfuscation.
//!
//! Resource access tokens are opaque base64 strings carrying obfuscated key
//! material. The decoded layout is fixed: 19 bytes of framing, then the
//! obfuscated key seed, then an 8-byte IV at the tail.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::trace;

use crate::{CryptoError, Result};

/// Length of the IV carried at the tail of a decoded token.
pub const IV_LEN: usize = 8;

/// Leading framing bytes that precede the key material.
const FRAMING_LEN: usize = 19;

/// XOR mask applied to the obfuscated key seed.
const SEED_MASK: u8 = 0x69;

/// Trailing bytes of the unmasked seed that are padding, not key material.
const SEED_PADDING_LEN: usize = 2;

/// Minimum decoded token length: framing plus IV.
const MIN_TOKEN_LEN: usize = FRAMING_LEN + IV_LEN;

/// Key material recovered from an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMaterial {
    /// Deobfuscated key seed, input to per-target key derivation.
    pub key_seed: Vec<u8>,
    /// Cipher IV, taken from the token verbatim.
    pub iv: [u8; IV_LEN],
}

/// Deobfuscate an access token into a key seed and IV.
///
/// The decoded bytes are split as `[framing | seed | iv]`. The seed is
/// unmasked by XOR with `0x69` and its last two bytes (unvalidated
/// padding) are discarded. The IV is used as-is.
pub fn deobfuscate_token(token: &str) -> Result<TokenMaterial> {
    let raw = STANDARD.decode(token)?;

    if raw.len() < MIN_TOKEN_LEN {
        return Err(CryptoError::TokenTooShort {
            expected: MIN_TOKEN_LEN,
            actual: raw.len(),
        });
    }

    let remaining = &raw[FRAMING_LEN..];
    let (seed_part, iv_part) = remaining.split_at(remaining.len() - IV_LEN);

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(iv_part);

    let mut key_seed: Vec<u8> = seed_part.iter().map(|b| b ^ SEED_MASK).collect();
    key_seed.truncate(key_seed.len().saturating_sub(SEED_PADDING_LEN));

    trace!(
        seed_len = key_seed.len(),
        "deobfuscated token ({} decoded bytes)",
        raw.len()
    );

    Ok(TokenMaterial { key_seed, iv })
}
