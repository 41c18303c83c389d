use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::{ProcessingRequest, ProcessingResult};

/// Screens of the flow; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Cover,
    Form,
    Loading,
    Results,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Page::Cover => "cover",
            Page::Form => "form",
            Page::Loading => "loading",
            Page::Results => "results",
        };
        write!(f, "{}", name)
    }
}

/// Events the orchestrator reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Submit,
    Succeed,
    Fail,
    Retry,
    Back,
    NewSession,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionEvent::Start => "start",
            SessionEvent::Submit => "submit",
            SessionEvent::Succeed => "succeed",
            SessionEvent::Fail => "fail",
            SessionEvent::Retry => "retry",
            SessionEvent::Back => "back",
            SessionEvent::NewSession => "new-session",
        };
        write!(f, "{}", name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {event} from the {page} page")]
    InvalidTransition { page: Page, event: SessionEvent },
}

/// A submitted request together with the ticket that identifies this submission
///
/// Two tickets with equal requests are still distinct submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: u64,
    pub request: ProcessingRequest,
    pub submitted_at: DateTime<Utc>,
}

/// Everything the flow carries between pages
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    pub active_page: Page,
    pub pending_request: Option<PendingRequest>,
    pub last_result: Option<ProcessingResult>,
    pub last_error: Option<String>,
    pub retry_count: u32,
}

impl SessionState {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            active_page: Page::Cover,
            pending_request: None,
            last_result: None,
            last_error: None,
            retry_count: 0,
        }
    }
}

/// Single owner of the active page and the data handed between pages
#[derive(Debug)]
pub struct PageOrchestrator {
    state: SessionState,
    next_ticket: u64,
}

impl Default for PageOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageOrchestrator {
    pub fn new() -> Self {
        Self {
            state: SessionState::new(),
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_page(&self) -> Page {
        self.state.active_page
    }

    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.state.pending_request.as_ref()
    }

    pub fn last_result(&self) -> Option<&ProcessingResult> {
        self.state.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.state.retry_count
    }

    fn reject(&self, event: SessionEvent) -> SessionError {
        tracing::debug!(
            session = %self.state.session_id,
            "Rejected {} on {} page",
            event,
            self.state.active_page
        );
        SessionError::InvalidTransition {
            page: self.state.active_page,
            event,
        }
    }

    fn go_to(&mut self, page: Page) {
        tracing::debug!(
            session = %self.state.session_id,
            "Page {} -> {}",
            self.state.active_page,
            page
        );
        self.state.active_page = page;
    }

    /// cover -> form
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state.active_page {
            Page::Cover => {
                self.go_to(Page::Form);
                Ok(())
            }
            _ => Err(self.reject(SessionEvent::Start)),
        }
    }

    /// form -> loading, storing the validated request under a fresh ticket
    pub fn submit(&mut self, request: ProcessingRequest) -> Result<&PendingRequest, SessionError> {
        if self.state.active_page != Page::Form {
            return Err(self.reject(SessionEvent::Submit));
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        tracing::info!(
            session = %self.state.session_id,
            "Submitting {} (model {}, target {})",
            request.youtube_url,
            request.model_size,
            request.target_language
        );

        self.state.last_error = None;
        self.state.retry_count = 0;
        self.go_to(Page::Loading);
        let pending = self.state.pending_request.insert(PendingRequest {
            ticket,
            request,
            submitted_at: Utc::now(),
        });
        Ok(&*pending)
    }

    /// loading -> results
    pub fn complete(&mut self, result: ProcessingResult) -> Result<(), SessionError> {
        if self.state.active_page != Page::Loading || self.state.pending_request.is_none() {
            return Err(self.reject(SessionEvent::Succeed));
        }

        if let Some(pending) = &self.state.pending_request {
            let waited = Utc::now() - pending.submitted_at;
            tracing::info!(
                session = %self.state.session_id,
                "Job {} ready {}s after submission",
                result.job_id,
                waited.num_seconds()
            );
        }

        self.state.last_result = Some(result);
        self.state.last_error = None;
        self.go_to(Page::Results);
        Ok(())
    }

    /// The request failed; the loading page stays active and shows the message
    pub fn record_failure(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.state.active_page != Page::Loading {
            return Err(self.reject(SessionEvent::Fail));
        }

        let message = message.into();
        tracing::warn!(session = %self.state.session_id, "Processing failed: {}", message);
        self.state.last_error = Some(message);
        Ok(())
    }

    /// The user asked to try the failed request again
    pub fn record_retry(&mut self) -> Result<u32, SessionError> {
        if self.state.active_page != Page::Loading || self.state.last_error.is_none() {
            return Err(self.reject(SessionEvent::Retry));
        }

        self.state.retry_count += 1;
        self.state.last_error = None;
        Ok(self.state.retry_count)
    }

    /// form -> cover, loading -> form (drops the request), results -> form
    pub fn back(&mut self) -> Result<(), SessionError> {
        match self.state.active_page {
            Page::Form => self.go_to(Page::Cover),
            Page::Loading => {
                self.state.pending_request = None;
                self.state.last_error = None;
                self.state.retry_count = 0;
                self.go_to(Page::Form);
            }
            Page::Results => self.go_to(Page::Form),
            Page::Cover => return Err(self.reject(SessionEvent::Back)),
        }
        Ok(())
    }

    /// results -> form with a clean slate
    pub fn new_session(&mut self) -> Result<(), SessionError> {
        if self.state.active_page != Page::Results {
            return Err(self.reject(SessionEvent::NewSession));
        }

        let previous = self.state.session_id;
        self.state = SessionState {
            active_page: Page::Form,
            ..SessionState::new()
        };
        tracing::info!(
            "Started session {} (previous {})",
            self.state.session_id,
            previous
        );
        Ok(())
    }
}
