//! Submission state machine.
//!
//! ```text
//! Idle ──Begin──▶ Loading ──Succeed(url)──▶ Succeeded(url)
//!                    │                           │
//!                    └──Fail(msg)──▶ Failed(msg) │
//!                                      │         │
//!         Loading ◀────────Begin───────┴─────────┘
//! ```
//!
//! [`reduce`] is the only way a state changes. Events that make no sense in
//! the current state are ignored, so a stray completion can never move the
//! machine out of `Idle` or overwrite a finished result.

use serde::Serialize;

/// Observable submission state. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Succeeded {
        #[serde(rename = "audioUrl")]
        audio_url: String,
    },
    Failed {
        message: String,
    },
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// What the UI shows for this state.
    pub fn view(&self) -> SubmissionView {
        match self {
            Self::Idle => SubmissionView {
                submit_enabled: true,
                audio_url: None,
                notification: None,
            },
            Self::Loading => SubmissionView {
                submit_enabled: false,
                audio_url: None,
                notification: None,
            },
            Self::Succeeded { audio_url } => SubmissionView {
                submit_enabled: true,
                audio_url: Some(audio_url.clone()),
                notification: None,
            },
            Self::Failed { message } => SubmissionView {
                submit_enabled: true,
                audio_url: None,
                notification: Some(message.clone()),
            },
        }
    }
}

/// Input to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// A valid submission started.
    Begin,
    /// The backend returned an audio URL.
    Succeed(String),
    /// Resolving or dispatching failed; carries the user-facing message.
    Fail(String),
    /// The submit was refused before starting (empty input, already busy).
    Reject,
}

/// Apply an event to a state.
pub fn reduce(state: &SubmissionState, event: SubmissionEvent) -> SubmissionState {
    use SubmissionEvent as E;
    use SubmissionState as S;

    match (state, event) {
        (S::Idle | S::Succeeded { .. } | S::Failed { .. }, E::Begin) => S::Loading,
        (S::Loading, E::Succeed(audio_url)) => S::Succeeded { audio_url },
        (S::Loading, E::Fail(message)) => S::Failed { message },
        (current, _) => current.clone(),
    }
}

/// Render model for a state plus an optional one-off notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub submit_enabled: bool,
    /// Used both as the audio source and as the download link.
    pub audio_url: Option<String>,
    pub notification: Option<String>,
}

impl SubmissionView {
    /// Attach a notification that is not part of the state, e.g. a rejected
    /// submit.
    pub fn with_notification(mut self, message: impl Into<String>) -> Self {
        self.notification = Some(message.into());
        self
    }
}
