//! Storage contract for notes.
//!
//! # Responsibility
//! - Define the narrow list/load/save/delete/new seam the shell depends on.
//! - Define the semantic error kinds every backend reports.
//!
//! # Invariants
//! - `list_notes` is ordered by `modified_at DESC, id ASC`.
//! - `save_note` stamps `modified_at` and re-derives `title` when content
//!   changed; the returned note is what was persisted.
//! - `delete_note` is not idempotent: a missing note is `NotFound`.

use crate::model::note::{Note, NoteId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error for note persistence operations.
#[derive(Debug)]
pub enum StoreError {
    /// No persisted note exists for the id.
    NotFound(NoteId),
    /// A persisted note exists but cannot be decoded.
    CorruptData { path: PathBuf, message: String },
    /// Filesystem-level failure.
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable short code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "note_not_found",
            Self::CorruptData { .. } => "corrupt_data",
            Self::Io { .. } => "io_error",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::CorruptData { path, message } => {
                write!(f, "corrupt note file `{}`: {message}", path.display())
            }
            Self::Io { path, source } => write!(f, "I/O error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound(_) | Self::CorruptData { .. } => None,
        }
    }
}

/// Backend-agnostic note storage.
///
/// Callers hold transient copies of notes; the store is the authority over
/// what is persisted for each id.
pub trait NoteStore {
    /// Lists all readable notes, most recently modified first.
    ///
    /// Unreadable entries are skipped with a warning, not reported.
    fn list_notes(&self) -> StoreResult<Vec<Note>>;
    /// Loads one note by id.
    fn load_note(&self, id: NoteId) -> StoreResult<Note>;
    /// Persists a note and returns the stored version.
    fn save_note(&self, note: &Note) -> StoreResult<Note>;
    /// Removes a note.
    fn delete_note(&self, id: NoteId) -> StoreResult<()>;
    /// Allocates, persists and returns an empty note with a fresh id.
    fn new_note(&self) -> StoreResult<Note>;
    /// Counts persisted notes without decoding them.
    fn note_count(&self) -> StoreResult<usize>;
}

/// Sorts notes into listing order: `modified_at DESC, id ASC`.
pub fn sort_for_listing(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
