use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::api::{ProcessingRequest, ProcessingResult, TranscriptApi};
use crate::session::PendingRequest;
use crate::utils;

/// Where the current submission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What a finished submission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Completed(ProcessingResult),
    Failed(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadingError {
    #[error("A request is already being processed")]
    AlreadySubmitting,

    #[error("There is no failed request to retry")]
    NothingToRetry,
}

/// Runs the processing request for the loading page
///
/// A request is sent once per ticket. `drive` takes `&mut self`, so a second call can never
/// start while one is awaiting the backend; the only way to send the same request again is
/// an explicit `retry` after a failure.
pub struct LoadingController {
    api: Arc<dyn TranscriptApi>,
    display_delay: Duration,
    show_indicator: bool,
    phase: LoadPhase,
    current: Option<PendingRequest>,
    last_error: Option<String>,
}

impl LoadingController {
    pub fn new(api: Arc<dyn TranscriptApi>, display_delay: Duration) -> Self {
        Self {
            api,
            display_delay,
            show_indicator: false,
            phase: LoadPhase::Idle,
            current: None,
            last_error: None,
        }
    }

    /// Show a spinner on the terminal while a request is in flight
    pub fn with_indicator(mut self, show_indicator: bool) -> Self {
        self.show_indicator = show_indicator;
        self
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_request(&self) -> Option<&ProcessingRequest> {
        self.current.as_ref().map(|pending| &pending.request)
    }

    /// Accept a request from the orchestrator
    ///
    /// Returns `Ok(true)` when a submission was queued, `Ok(false)` when this ticket was
    /// already taken (it is not submitted again).
    pub fn start(&mut self, pending: &PendingRequest) -> Result<bool, LoadingError> {
        let seen = self
            .current
            .as_ref()
            .is_some_and(|current| current.ticket == pending.ticket);

        if seen {
            tracing::debug!("Request ticket {} already taken, not resubmitting", pending.ticket);
            return Ok(false);
        }

        if self.phase == LoadPhase::Submitting {
            return Err(LoadingError::AlreadySubmitting);
        }

        self.current = Some(pending.clone());
        self.last_error = None;
        self.phase = LoadPhase::Submitting;
        Ok(true)
    }

    /// Re-issue the stored request after a failure
    ///
    /// Attempts are counted by the session, not here.
    pub fn retry(&mut self) -> Result<(), LoadingError> {
        match self.phase {
            LoadPhase::Failed => {
                self.last_error = None;
                self.phase = LoadPhase::Submitting;
                if let Some(pending) = &self.current {
                    tracing::info!("Retrying request ticket {}", pending.ticket);
                }
                Ok(())
            }
            LoadPhase::Submitting => Err(LoadingError::AlreadySubmitting),
            _ => Err(LoadingError::NothingToRetry),
        }
    }

    /// Forget the current request; an in-flight call is not aborted
    pub fn reset(&mut self) {
        self.phase = LoadPhase::Idle;
        self.current = None;
        self.last_error = None;
    }

    /// Send the queued request and wait for it to settle
    ///
    /// Returns `None` when nothing is queued.
    pub async fn drive(&mut self) -> Option<LoadOutcome> {
        if self.phase != LoadPhase::Submitting {
            return None;
        }
        let request = self.current.as_ref()?.request.clone();

        let indicator = self.show_indicator.then(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message(
                "Processing your video: downloading, transcribing and generating notes...",
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner
        });

        let started = Instant::now();
        let response = self.api.submit(&request).await;
        let elapsed = utils::format_duration(started.elapsed().as_secs_f64());

        match response {
            Ok(result) => {
                if let Some(spinner) = &indicator {
                    spinner.finish_with_message(format!("Processing complete ({})", elapsed));
                }
                tracing::info!("Job {} finished after {}", result.job_id, elapsed);

                sleep(self.display_delay).await;
                self.phase = LoadPhase::Succeeded;
                Some(LoadOutcome::Completed(result))
            }
            Err(error) => {
                if let Some(spinner) = &indicator {
                    spinner.finish_and_clear();
                }
                let message = error.to_string();
                tracing::warn!("Request failed after {}: {}", elapsed, message);

                self.last_error = Some(message.clone());
                self.phase = LoadPhase::Failed;
                Some(LoadOutcome::Failed(message))
            }
        }
    }
}
