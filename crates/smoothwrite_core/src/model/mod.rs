//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical in-memory `Note` record and its on-disk shape.
//! - Own the derived projections (title, preview) computed from markup.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` assigned at creation.
//! - `modified_at >= created_at` for every persisted note.
//! - `title` is never empty; the placeholder is `UNTITLED_TITLE`.

pub mod markup;
pub mod note;
