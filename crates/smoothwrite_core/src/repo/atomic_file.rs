//! Write-then-rename file replacement.
//!
//! # Responsibility
//! - Stage new bytes in a temporary file next to the target.
//! - Publish them with a single rename so readers see old or new, never half.
//!
//! # Invariants
//! - Temporary files live in the target's directory (same filesystem).
//! - Temporary file names start with `.` and end with `TEMP_FILE_SUFFIX`, so
//!   directory scans can tell them apart from published files.
//! - Staged bytes are flushed to disk before the rename.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Suffix of staged (not yet published) files.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
const TEMP_FILE_PREFIX: &str = ".";

/// Bytes written to a temporary file, waiting to replace `target`.
///
/// Dropping a `StagedWrite` without committing removes the temporary file.
pub struct StagedWrite {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// Writes `bytes` to a fresh temporary file beside `target` and syncs it.
    pub fn stage(target: &Path, bytes: &[u8]) -> io::Result<Self> {
        let dir = parent_dir(target)?;
        let mut file = Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(TEMP_FILE_SUFFIX)
            .rand_bytes(8)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok(Self {
            file,
            target: target.to_path_buf(),
        })
    }

    /// Path of the staged temporary file.
    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically renames the staged file over the target.
    pub fn commit(self) -> io::Result<()> {
        self.file
            .persist(&self.target)
            .map(|_| ())
            .map_err(|err| err.error)
    }
}

/// Replaces `target` with `bytes` using write-then-rename.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    StagedWrite::stage(target, bytes)?.commit()
}

/// Returns whether `path` names a staged file left behind by `StagedWrite`.
pub fn is_staged_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX))
        .unwrap_or(false)
}

fn parent_dir(target: &Path) -> io::Result<&Path> {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("target `{}` has no parent directory", target.display()),
        )),
    }
}
