//! Note use-case service.
//!
//! # Responsibility
//! - Provide the shell-facing note operations on top of any `NoteStore`.
//! - Own list-view projections (summaries, search filtering).
//! - Seed a welcome note on first start.
//!
//! # Invariants
//! - Listing and search results keep `modified_at DESC, id ASC` order.
//! - Single-note failures are returned to the caller, never swallowed.

use crate::model::markup;
use crate::model::note::{Note, NoteId, NoteSummary};
use crate::repo::note_store::{NoteStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const WELCOME_NOTE_CONTENT: &str = "<h1>Welcome to Smooth Write</h1>\
<p>Notes are saved automatically a moment after you stop typing.</p>\
<ul>\
<li><b>New note</b>: Ctrl+N</li>\
<li><b>Save now</b>: Ctrl+S</li>\
<li><b>Search</b>: Ctrl+F filters by title and text</li>\
</ul>\
<p>Delete this note whenever you like.</p>";

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<StoreError> for NoteServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over store implementations.
pub struct NoteService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// All notes, most recently modified first.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        Ok(self.store.list_notes()?)
    }

    /// List-view projection of `list_notes`.
    pub fn list_summaries(&self) -> NoteServiceResult<Vec<NoteSummary>> {
        Ok(self.list_notes()?.iter().map(NoteSummary::from).collect())
    }

    /// Notes whose title or plain-text content contains `query`,
    /// case-insensitively. A blank query matches everything.
    pub fn search_notes(&self, query: &str) -> NoteServiceResult<Vec<Note>> {
        let notes = self.list_notes()?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(notes);
        }
        Ok(notes
            .into_iter()
            .filter(|note| note_matches(note, &needle))
            .collect())
    }

    pub fn load_note(&self, id: NoteId) -> NoteServiceResult<Note> {
        Ok(self.store.load_note(id)?)
    }

    pub fn save_note(&self, note: &Note) -> NoteServiceResult<Note> {
        Ok(self.store.save_note(note)?)
    }

    pub fn delete_note(&self, id: NoteId) -> NoteServiceResult<()> {
        Ok(self.store.delete_note(id)?)
    }

    /// Allocates and persists an empty note.
    pub fn create_note(&self) -> NoteServiceResult<Note> {
        Ok(self.store.new_note()?)
    }

    /// Creates a note with initial content in one step.
    pub fn create_note_with_content(&self, content: impl Into<String>) -> NoteServiceResult<Note> {
        let mut note = self.store.new_note()?;
        note.update_content(content);
        Ok(self.store.save_note(&note)?)
    }

    pub fn note_count(&self) -> NoteServiceResult<usize> {
        Ok(self.store.note_count()?)
    }

    /// Persists a welcome note when the store is empty.
    ///
    /// Returns the created note, or `None` when notes already exist.
    pub fn ensure_welcome_note(&self) -> NoteServiceResult<Option<Note>> {
        if self.store.note_count()? > 0 {
            return Ok(None);
        }
        let note = self.create_note_with_content(WELCOME_NOTE_CONTENT)?;
        info!("event=welcome_note module=service status=ok note_id={}", note.id);
        Ok(Some(note))
    }
}

fn note_matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || markup::to_plain_text(&note.content)
            .to_lowercase()
            .contains(needle)
}
