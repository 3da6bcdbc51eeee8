//! Note persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the backend-agnostic `NoteStore` seam.
//! - Keep file layout and write discipline inside the persistence boundary.
//!
//! # Invariants
//! - Store writes validate notes before persisting.
//! - Store reads reject invalid persisted state as `CorruptData`.

pub mod atomic_file;
pub mod json_store;
pub mod note_store;
