//! Extraction orchestrator: mirror an open archive onto a destination
//! directory.

use std::fs;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::packfile::Packfile;
use crate::Result;

/// Outcome of an extraction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written to the destination.
    pub extracted: usize,
    /// Files that failed to read or write; the sweep continued past them.
    pub failed: usize,
}

/// Extract every file in the archive under `dest`, mirroring the
/// archive-relative paths and creating parent directories on demand.
///
/// Per-file failures are logged and counted, and do not abort the
/// remaining files. The result is therefore a complete-or-partial tree;
/// callers that need all-or-nothing semantics must check
/// [`ExtractSummary::failed`].
pub fn extract_all<R: Read + Seek>(
    archive: &mut Packfile<R>,
    dest: &Path,
) -> Result<ExtractSummary> {
    let files = archive.get_all_files("/");
    debug!(count = files.len(), dest = %dest.display(), "extracting archive");

    let mut summary = ExtractSummary::default();
    for file in files {
        match extract_one(archive, &file, dest) {
            Ok(true) => summary.extracted += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(file = %file, error = %e, "failed to extract file");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Extract a single file; `Ok(false)` means the path had no content
/// (directory or miss).
fn extract_one<R: Read + Seek>(
    archive: &mut Packfile<R>,
    file: &str,
    dest: &Path,
) -> Result<bool> {
    let Some(content) = archive.read_file(file)? else {
        return Ok(false);
    };

    let target = dest.join(file.trim_start_matches('/'));
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, content)?;

    trace!(file, "extracted");
    Ok(true)
}
