//! speakform-lib — Submission engine.
//!
//! Input resolution, request dispatch, the submission controller, audio
//! download, and the HTTP form UI. Depends on speakform-core for pure types
//! and the state machine.

pub mod controller;
pub mod dispatcher;
pub mod download;
pub mod page;
pub mod resolver;
pub mod server;

// Re-export speakform-core for convenience
pub use speakform_core;
