//! RPF2 ("Packfile v2") container reading and resource extraction.
//!
//! This crate provides:
//! - A reader for the RPF2 container format (header, TOC, entry table,
//!   name table) with path resolution, directory listing and recursive
//!   enumeration
//! - An extraction orchestrator that mirrors an archive onto a destination
//!   directory
//! - End-to-end pipelines that go from an access token plus an encrypted
//!   blob to an extracted plaintext tree
//!
//! Decryption primitives live in the `rpf-crypto` crate.

pub mod error;
pub mod extract;
pub mod packfile;
pub mod pipeline;

pub use error::Error;
pub use extract::{extract_all, ExtractSummary};
pub use packfile::{DirEntry, Entry, EntryId, Packfile, PackfileHeader, RPF2_MAGIC};
pub use pipeline::{
    decrypt_and_dump, decrypt_and_dump_in, decrypt_resource, dump_archive, DumpOutcome,
    ResourceOutcome,
};

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
