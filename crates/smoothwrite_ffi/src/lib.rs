//! Flutter-facing bridge over `smoothwrite_core`.

pub mod api;
mod session;
