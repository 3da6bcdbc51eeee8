//! Core domain logic for Smooth Write.
//! This crate is the single source of truth for note invariants, persistence
//! and auto-save scheduling. GUI shells call into it; it never calls back
//! into them except through the auto-save callback.

pub mod autosave;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use autosave::clock::{Clock, ManualClock, SystemClock};
pub use autosave::manager::{AutoSaveManager, AutoSaveState};
pub use config::{ConfigError, CoreConfig, DEFAULT_AUTO_SAVE_DELAY_MS};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{
    derive_title, Note, NoteFormatError, NoteId, NoteSummary, NoteValidationError, UNTITLED_TITLE,
};
pub use repo::json_store::{note_file_name, JsonNoteStore};
pub use repo::note_store::{NoteStore, StoreError, StoreResult};
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
