//! Submission error taxonomy.

use thiserror::Error;

/// Shown for both server rejections and transport failures.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process text. Please try again.";

/// Why a submission attempt did not produce an audio URL.
///
/// `Display` is the developer diagnostic; [`SubmissionError::user_message`]
/// is what the UI shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no text entered and no file selected")]
    EmptyInput,

    #[error("failed to read {name}: {reason}")]
    FileRead { name: String, reason: String },

    #[error("{name} is {size} bytes, limit is {limit}")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("server rejected request with status {status}")]
    ServerRejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("a submission is already in progress")]
    Busy,
}

/// Invalid client configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl SubmissionError {
    /// Notification text for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => "Please enter text or upload a file.".into(),
            Self::FileRead { name, .. } => format!("Could not read \"{name}\" as text."),
            Self::FileTooLarge { name, limit, .. } => {
                format!("\"{name}\" is too large (limit is {limit} bytes).")
            }
            Self::ServerRejected { .. } | Self::Transport(_) => GENERIC_FAILURE_MESSAGE.into(),
            Self::Busy => "A submission is already in progress.".into(),
        }
    }
}
