//! Note domain model.
//!
//! # Responsibility
//! - Define the record the editor shell edits and the store persists.
//! - Provide title/preview derivation shared by storage and list views.
//! - Define the flat JSON record used for one-file-per-note storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `modified_at` is never earlier than `created_at`.
//! - `title` is never blank; it falls back to `UNTITLED_TITLE`.
//! - JSON encoding is field-for-field and lossless for all six fields.

use crate::model::markup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note, also the basis of its file name.
pub type NoteId = Uuid;

/// Title used when content has no visible text.
pub const UNTITLED_TITLE: &str = "Untitled";

/// Maximum number of characters kept from the first content line.
pub const TITLE_MAX_CHARS: usize = 50;

const TITLE_ELLIPSIS: &str = "...";
const PREVIEW_MAX_CHARS: usize = 100;

/// Model-level invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// `modified_at` is earlier than `created_at`.
    ModifiedBeforeCreated {
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    },
    /// Title is empty or whitespace only.
    BlankTitle,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModifiedBeforeCreated {
                created_at,
                modified_at,
            } => write!(
                f,
                "modified_at ({}) must not be earlier than created_at ({})",
                modified_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
            Self::BlankTitle => write!(f, "title must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Failure to decode a note record from its serialized form.
#[derive(Debug)]
pub enum NoteFormatError {
    /// Text is not a well-formed note record.
    Json(serde_json::Error),
    /// Record decoded but violates model invariants.
    Invalid(NoteValidationError),
}

impl Display for NoteFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed note record: {err}"),
            Self::Invalid(err) => write!(f, "invalid note record: {err}"),
        }
    }
}

impl Error for NoteFormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for NoteFormatError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<NoteValidationError> for NoteFormatError {
    fn from(value: NoteValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// A single note.
///
/// `content` is opaque editor markup; nothing in core rewrites it.
/// Timestamps serialize as RFC 3339 strings in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Reserved for favorites filtering; no behavior depends on it yet.
    #[serde(default)]
    pub is_favorite: bool,
}

impl Note {
    /// Creates an empty note with a fresh id, stamped with the current time.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4(), Utc::now())
    }

    /// Creates an empty note with a caller-provided id and creation time.
    ///
    /// Used by stores that allocate ids themselves and by tests that need
    /// deterministic timestamps.
    pub fn with_id(id: NoteId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: UNTITLED_TITLE.to_string(),
            content: String::new(),
            created_at,
            modified_at: created_at,
            is_favorite: false,
        }
    }

    /// Replaces content and re-derives the title in memory.
    ///
    /// Does not touch `modified_at`; that is stamped by the store on save.
    pub fn update_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.title = derive_title(&self.content);
    }

    /// Checks model invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.modified_at < self.created_at {
            return Err(NoteValidationError::ModifiedBeforeCreated {
                created_at: self.created_at,
                modified_at: self.modified_at,
            });
        }
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        Ok(())
    }

    /// Encodes this note as a human-readable JSON record.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Decodes and validates a JSON note record.
    pub fn from_json(raw: &str) -> Result<Self, NoteFormatError> {
        let note: Note = serde_json::from_str(raw)?;
        note.validate()?;
        Ok(note)
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a display title from note content.
///
/// Rules:
/// - Markup is reduced to plain text; the first non-blank line is used.
/// - Lines longer than `TITLE_MAX_CHARS` are cut and suffixed with `...`.
/// - Content with no visible text yields `UNTITLED_TITLE`.
pub fn derive_title(content: &str) -> String {
    let Some(line) = markup::first_visible_line(content) else {
        return UNTITLED_TITLE.to_string();
    };

    if line.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = line.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(TITLE_ELLIPSIS);
        title
    } else {
        line
    }
}

/// Listing-time view of a note, for list widgets that do not need content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    /// Plain-text excerpt of the content (nullable).
    pub preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            preview: markup::summarize(&note.content, PREVIEW_MAX_CHARS),
            created_at: note.created_at,
            modified_at: note.modified_at,
            is_favorite: note.is_favorite,
        }
    }
}

fn untitled() -> String {
    UNTITLED_TITLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::{derive_title, Note, NoteSummary, TITLE_MAX_CHARS, UNTITLED_TITLE};

    #[test]
    fn title_is_first_line() {
        assert_eq!(derive_title("Hello world\nmore text"), "Hello world");
    }

    #[test]
    fn title_skips_leading_blank_lines() {
        assert_eq!(derive_title("\n   \n  Agenda  \nitems"), "Agenda");
    }

    #[test]
    fn empty_content_gets_placeholder() {
        assert_eq!(derive_title(""), UNTITLED_TITLE);
        assert_eq!(derive_title("   \n\t"), UNTITLED_TITLE);
    }

    #[test]
    fn long_first_line_is_truncated_with_ellipsis() {
        let line = "x".repeat(TITLE_MAX_CHARS + 10);
        let title = derive_title(&line);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let line = "é".repeat(TITLE_MAX_CHARS);
        assert_eq!(derive_title(&line), line);
    }

    #[test]
    fn update_content_rederives_title() {
        let mut note = Note::new();
        note.update_content("<p>Groceries</p><p>eggs</p>");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "<p>Groceries</p><p>eggs</p>");
    }

    #[test]
    fn new_note_is_valid_and_untitled() {
        let note = Note::new();
        assert_eq!(note.title, UNTITLED_TITLE);
        assert!(note.content.is_empty());
        assert_eq!(note.created_at, note.modified_at);
        assert!(!note.is_favorite);
        note.validate().expect("new note should be valid");
    }

    #[test]
    fn summary_carries_plain_preview() {
        let mut note = Note::new();
        note.update_content("<h1>Trip</h1><p>pack   bags</p>");
        let summary = NoteSummary::from(&note);
        assert_eq!(summary.title, "Trip");
        assert_eq!(summary.preview.as_deref(), Some("Trip pack bags"));
    }
}
