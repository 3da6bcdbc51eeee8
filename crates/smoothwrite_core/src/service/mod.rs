//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep FFI/CLI layers decoupled from storage details.

pub mod note_service;
