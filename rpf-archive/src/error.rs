//! Error types for RPF2 parsing and extraction.

use thiserror::Error;

/// RPF2 error types.
///
/// Ordinary lookup misses (an absent path) are not errors; those surface as
/// `None`/empty results from the reader.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File has incorrect magic - possibly wrong file format.
    #[error("invalid RPF2 magic: {0:#010x}")]
    BadMagic(u32),

    /// Container-level encryption is unsupported; decryption happens
    /// upstream, before parsing.
    #[error("archive is encrypted (crypto flag {0:#x}), only plaintext RPF2 is supported")]
    EncryptedArchive(u32),

    /// Header was shorter than the fixed 20-byte layout.
    #[error("truncated header: expected 20 bytes, got {0}")]
    TruncatedHeader(usize),

    /// TOC region was shorter than the header promised.
    #[error("truncated TOC: expected {expected} bytes, got {actual}")]
    TruncatedToc { expected: usize, actual: usize },

    /// Entry table is empty, so there is no root directory.
    #[error("archive has no entries")]
    EmptyEntryTable,

    /// Crypto error from rpf-crypto.
    #[error("crypto error: {0}")]
    Crypto(#[from] rpf_crypto::CryptoError),
}
