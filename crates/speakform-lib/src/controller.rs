//! Submission controller — owns the [`SubmissionState`] and sequences one
//! submission at a time:
//!
//! ```text
//! submit(input) → precheck (reject: state untouched)
//!     → Begin (Loading, submit disabled)
//!     → resolver: read/trim input          ─┐ either may fail → Failed(msg)
//!     → dispatcher: POST payload            ─┘
//!     → Succeed(url)
//! ```
//!
//! Single-flight: entering `Loading` is a compare-and-set on the state cell,
//! so a second submit while one is pending gets [`SubmissionError::Busy`]
//! and sends nothing. A submit future dropped mid-flight settles to `Failed`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use speakform_core::error::{ConfigError, SubmissionError};
use speakform_core::input::{SubmissionForm, SubmissionInput};
use speakform_core::state::{reduce, SubmissionEvent, SubmissionState};
use speakform_core::types::ClientConfig;

use crate::dispatcher::Dispatcher;
use crate::resolver::Resolver;

/// Cloneable handle to the controller. Clones share one state.
#[derive(Clone)]
pub struct SubmissionController {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Resolver,
    dispatcher: Dispatcher,
    state_tx: watch::Sender<SubmissionState>,
}

impl SubmissionController {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let dispatcher = Dispatcher::new(config)?;
        let resolver = Resolver::new(config.max_file_bytes);
        let (state_tx, _) = watch::channel(SubmissionState::Idle);
        Ok(Self {
            inner: Arc::new(Inner {
                resolver,
                dispatcher,
                state_tx,
            }),
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> SubmissionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.inner.resolver.max_file_bytes()
    }

    pub fn endpoint(&self) -> &str {
        self.inner.dispatcher.endpoint().as_str()
    }

    /// Submit whatever the form holds. A file takes precedence over text.
    pub async fn submit_form(&self, form: &SubmissionForm) -> Result<String, SubmissionError> {
        self.submit(form.input()).await
    }

    /// Run one submission to completion.
    ///
    /// `EmptyInput` for blank text and `Busy` leave the state as it was.
    /// Every other outcome ends in `Succeeded` or `Failed`.
    pub async fn submit(&self, input: SubmissionInput) -> Result<String, SubmissionError> {
        if let Err(e) = input.precheck() {
            info!("submission rejected: {e}");
            self.apply(SubmissionEvent::Reject);
            return Err(e);
        }

        let Some(in_flight) = self.try_begin() else {
            info!("submission rejected: already loading");
            self.apply(SubmissionEvent::Reject);
            return Err(SubmissionError::Busy);
        };

        info!("submission started");
        let result = self.resolve_and_dispatch(input).await;

        match &result {
            Ok(audio_url) => {
                info!("submission succeeded: {audio_url}");
                in_flight.settle(SubmissionEvent::Succeed(audio_url.clone()));
            }
            Err(e) => {
                warn!("submission failed: {e}");
                in_flight.settle(SubmissionEvent::Fail(e.user_message()));
            }
        }
        result
    }

    async fn resolve_and_dispatch(&self, input: SubmissionInput) -> Result<String, SubmissionError> {
        let payload = self.inner.resolver.resolve(input).await?;
        self.inner.dispatcher.submit(&payload).await
    }

    /// Enter `Loading` unless already there. The returned guard must be
    /// settled; dropping it fails the submission.
    fn try_begin(&self) -> Option<InFlight<'_>> {
        let began = self.inner.state_tx.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = reduce(state, SubmissionEvent::Begin);
            true
        });
        began.then(|| InFlight {
            controller: self,
            settled: false,
        })
    }

    fn apply(&self, event: SubmissionEvent) {
        self.inner.state_tx.send_if_modified(|state| {
            let next = reduce(state, event);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
    }
}

/// Shown when a submission future is dropped before it finishes.
const INTERRUPTED_MESSAGE: &str = "Submission was interrupted. Please try again.";

/// Holds the controller in `Loading` for one submission.
struct InFlight<'a> {
    controller: &'a SubmissionController,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, event: SubmissionEvent) {
        self.settled = true;
        self.controller.apply(event);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("submission dropped before completion");
            self.controller
                .apply(SubmissionEvent::Fail(INTERRUPTED_MESSAGE.into()));
        }
    }
}
