//! speakform-core — Pure types and the submission state machine.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod error;
pub mod input;
pub mod state;
pub mod types;
