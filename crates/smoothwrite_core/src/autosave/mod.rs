//! Debounced auto-save scheduling.
//!
//! # Responsibility
//! - Coalesce bursts of "content changed" signals into one save invocation.
//! - Stay independent of notes and storage: the save itself is a callback.
//!
//! # Invariants
//! - Runs on the caller's (event loop) thread; nothing here spawns threads.
//! - At most one save fires per quiet period.

pub mod clock;
pub mod manager;
