//! Video Notes - A Rust CLI client for a video transcription and notes backend
//!
//! This library drives the request lifecycle against the processing service: it validates
//! a YouTube URL, submits the job, shows the outcome and fetches the generated transcript,
//! notes and PDF artifacts.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod form;
pub mod languages;
pub mod loading;
pub mod output;
pub mod results;
pub mod session;
pub mod utils;

pub use api::{ArtifactKind, HttpApiClient, ProcessingRequest, ProcessingResult, TranscriptApi};
pub use app::{App, AppUpdate, UserAction};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use form::{FormState, ModelSize};
pub use session::{Page, PageOrchestrator};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Errors surfaced by the backend client
///
/// The `Display` text of every variant is what the user sees in the failure view.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("No response from server. Please check your connection.")]
    NetworkUnreachable,

    #[error("{0}")]
    BackendError(String),

    #[error("Request failed: {0}")]
    UnknownError(String),

    #[error("Progress not found")]
    ProgressNotFound,

    #[error("Failed to get progress")]
    ProgressQueryFailed,

    #[error("Download failed: {0}. Please try again.")]
    DownloadFailed(String),
}
