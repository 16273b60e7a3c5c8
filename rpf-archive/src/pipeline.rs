//! End-to-end decrypt pipelines.
//!
//! `decrypt_and_dump` takes an access token plus an encrypted container
//! blob and produces the extracted plaintext tree; `decrypt_resource` does
//! the same for standalone (non-container) assets, writing the raw
//! plaintext instead of parsing it.
//!
//! Decryption always completes fully before parsing begins; the formats
//! are strictly sequential. Each invocation uses its own
//! collision-resistant scratch file, so independent pipelines may run
//! concurrently.

use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, warn};

use rpf_crypto::{chacha::decrypt_chacha20, deobfuscate_token, derive_key};

use crate::extract::{extract_all, ExtractSummary};
use crate::packfile::Packfile;
use crate::Result;

/// Outcome of [`decrypt_and_dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOutcome {
    /// Destination the tree was mirrored into.
    pub output_dir: PathBuf,
    /// Extraction counters.
    pub summary: ExtractSummary,
}

/// Outcome of [`decrypt_resource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOutcome {
    /// Where the plaintext was written.
    pub output_path: PathBuf,
    /// Plaintext size in bytes (same as the ciphertext, stream cipher).
    pub decrypted_len: usize,
}

/// Decrypt an encrypted container and extract its tree into `output_dir`.
///
/// The token is deobfuscated, a key is derived for `target_name` (or the
/// canonical primary asset name), the ciphertext is decrypted fully in
/// memory, persisted to a uniquely-named scratch file in the system temp
/// dir, parsed as RPF2 and extracted. Scratch removal is always attempted;
/// a removal failure is logged and never overrides the primary result.
pub fn decrypt_and_dump<R: Read>(
    token: &str,
    ciphertext: R,
    output_dir: &Path,
    target_name: Option<&str>,
) -> Result<DumpOutcome> {
    decrypt_and_dump_impl(token, ciphertext, output_dir, target_name, None)
}

/// Same as [`decrypt_and_dump`], with the scratch file placed in
/// `scratch_dir` instead of the system temp dir.
pub fn decrypt_and_dump_in<R: Read>(
    token: &str,
    ciphertext: R,
    output_dir: &Path,
    target_name: Option<&str>,
    scratch_dir: &Path,
) -> Result<DumpOutcome> {
    decrypt_and_dump_impl(token, ciphertext, output_dir, target_name, Some(scratch_dir))
}

fn decrypt_and_dump_impl<R: Read>(
    token: &str,
    mut ciphertext: R,
    output_dir: &Path,
    target_name: Option<&str>,
    scratch_dir: Option<&Path>,
) -> Result<DumpOutcome> {
    let plaintext = decrypt_in_memory(token, &mut ciphertext, target_name)?;

    let mut builder = Builder::new();
    builder.prefix("rpf-dec-").suffix(".tmp");
    let mut scratch = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    scratch.write_all(&plaintext)?;
    scratch.flush()?;
    debug!(scratch = %scratch.path().display(), "persisted decrypted container");

    // Parse from the scratch copy; the temp file cleans itself up on every
    // error path, and removal failure on the success path is only logged.
    let result = dump_scratch(scratch.reopen()?, output_dir);

    if let Err(e) = scratch.close() {
        warn!(error = %e, "could not clean up scratch file");
    }

    let summary = result?;
    Ok(DumpOutcome {
        output_dir: output_dir.to_path_buf(),
        summary,
    })
}

/// Decrypt a standalone asset and write the raw plaintext to
/// `output_path`, bypassing archive parsing.
pub fn decrypt_resource<R: Read>(
    token: &str,
    mut ciphertext: R,
    output_path: &Path,
    target_name: Option<&str>,
) -> Result<ResourceOutcome> {
    let plaintext = decrypt_in_memory(token, &mut ciphertext, target_name)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, &plaintext)?;

    debug!(output = %output_path.display(), len = plaintext.len(), "decrypted resource");
    Ok(ResourceOutcome {
        output_path: output_path.to_path_buf(),
        decrypted_len: plaintext.len(),
    })
}

/// Extract an already-decrypted container file into `output_dir`.
pub fn dump_archive(archive_path: &Path, output_dir: &Path) -> Result<ExtractSummary> {
    dump_scratch(fs::File::open(archive_path)?, output_dir)
}

/// Token → key → full in-memory decrypt. Shared head of both pipelines.
fn decrypt_in_memory<R: Read>(
    token: &str,
    ciphertext: &mut R,
    target_name: Option<&str>,
) -> Result<Vec<u8>> {
    let material = deobfuscate_token(token)?;
    let key = derive_key(&material.key_seed, target_name);

    let mut data = Vec::new();
    ciphertext.read_to_end(&mut data)?;
    decrypt_chacha20(&mut data, &key, &material.iv)?;

    Ok(data)
}

fn dump_scratch(file: fs::File, output_dir: &Path) -> Result<ExtractSummary> {
    let mut archive = Packfile::open(BufReader::new(file))?;
    let summary = extract_all(&mut archive, output_dir)?;
    archive.close();
    Ok(summary)
}
