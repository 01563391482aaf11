//! Shared types for the speakform client.
//!
//! Kept in speakform-core so consumers can depend on the wire shapes and
//! configuration without pulling in tokio or reqwest.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── Configuration ─────────────────────────────────────────────────────────

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/process-text";

/// Applied per request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on an uploaded text file (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the text processing endpoint.
    pub endpoint: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub max_file_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

// ─── Wire types ────────────────────────────────────────────────────────────

/// Request body posted to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTextRequest<'a> {
    pub text: &'a str,
}

/// Body of a 200 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextResponse {
    pub audio_url: String,
    /// Server-side processing log, when the backend includes one.
    #[serde(default)]
    pub logs: Option<String>,
}

// ─── Download types ────────────────────────────────────────────────────────

/// Audio download progress payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub percent: f32,
    pub bytes_done: u64,
    /// `None` when the server sends no content length.
    pub bytes_total: Option<u64>,
    pub status: String, // "downloading" | "complete"
}
