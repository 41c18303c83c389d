use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod client;

pub use client::HttpApiClient;

use crate::form::ModelSize;
use crate::ClientError;

/// Body of `POST /api/transcript`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub youtube_url: String,
    pub model_size: ModelSize,
    pub target_language: String,
}

/// Backend-relative locations of everything a job produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    #[serde(rename = "audio_path")]
    pub audio: String,
    #[serde(rename = "transcript_path")]
    pub transcript: String,
    #[serde(rename = "notes_path")]
    pub notes: String,
    #[serde(rename = "pdf_path")]
    pub pdf: String,
}

/// Successful response of `POST /api/transcript`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Opaque job identifier assigned by the backend
    #[serde(rename = "video_id")]
    pub job_id: String,

    pub detected_language: String,

    pub target_language: String,

    /// Reported by the backend, never re-derived locally
    #[serde(rename = "translated")]
    pub was_translated: bool,

    #[serde(flatten)]
    pub artifact_paths: ArtifactPaths,
}

/// Response of `GET /api/progress/{video_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub video_id: String,
    pub current_step: String,
    pub progress_percentage: f64,
    pub step_description: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Downloadable outputs of a job
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Plain text transcript
    Transcript,
    /// Markdown notes
    Notes,
    /// PDF document with all content
    Pdf,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Transcript,
        ArtifactKind::Notes,
        ArtifactKind::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Transcript => "transcript",
            ArtifactKind::Notes => "notes",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Transcript => "txt",
            ArtifactKind::Notes => "md",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::Transcript => "Transcript",
            ArtifactKind::Notes => "AI Notes",
            ArtifactKind::Pdf => "PDF Document",
        }
    }

    /// Saved filename, `video_{id}_{kind}.{ext}`
    pub fn file_name(&self, job_id: &str) -> String {
        format!("video_{}_{}.{}", job_id, self.as_str(), self.extension())
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Path of the download endpoint for one artifact of a job
pub fn build_download_url(job_id: &str, kind: ArtifactKind) -> String {
    format!("/api/download/{}/{}", urlencoding::encode(job_id), kind.as_str())
}

/// Remote processing service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Submit a job and wait for the backend to finish it
    async fn submit(&self, request: &ProcessingRequest) -> Result<ProcessingResult, ClientError>;

    /// Ask the backend how far a job has progressed
    async fn query_progress(&self, job_id: &str) -> Result<ProgressStatus, ClientError>;
}

/// Fetches job artifacts to local storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    /// Download one artifact into `dir`, returning the saved file
    async fn download(
        &self,
        job_id: &str,
        kind: ArtifactKind,
        dir: &Path,
    ) -> Result<PathBuf, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_download_url() {
        assert_eq!(
            build_download_url("abc123", ArtifactKind::Transcript),
            "/api/download/abc123/transcript"
        );
        assert_eq!(build_download_url("abc123", ArtifactKind::Notes), "/api/download/abc123/notes");
        assert_eq!(build_download_url("abc123", ArtifactKind::Pdf), "/api/download/abc123/pdf");
    }

    #[test]
    fn test_build_download_url_is_deterministic() {
        for kind in ArtifactKind::ALL {
            assert_eq!(build_download_url("x y", kind), build_download_url("x y", kind));
        }
        assert_eq!(build_download_url("x y", ArtifactKind::Pdf), "/api/download/x%20y/pdf");
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ArtifactKind::Transcript.extension(), "txt");
        assert_eq!(ArtifactKind::Notes.extension(), "md");
        assert_eq!(ArtifactKind::Pdf.extension(), "pdf");
    }

    #[test]
    fn test_file_name_convention() {
        assert_eq!(ArtifactKind::Notes.file_name("abc123"), "video_abc123_notes.md");
        assert_eq!(ArtifactKind::Pdf.file_name("abc123"), "video_abc123_pdf.pdf");
    }

    #[test]
    fn test_request_wire_format() {
        let request = ProcessingRequest {
            youtube_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            model_size: ModelSize::Base,
            target_language: "en".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "youtube_url": "https://youtu.be/dQw4w9WgXcQ",
                "model_size": "base",
                "target_language": "en"
            })
        );
    }

    #[test]
    fn test_result_wire_format() {
        let body = r#"{
            "video_id": "abc123",
            "detected_language": "en",
            "target_language": "fr",
            "translated": true,
            "audio_path": "downloads/abc123.mp3",
            "transcript_path": "transcripts/abc123.txt",
            "notes_path": "notes/abc123.md",
            "pdf_path": "pdfs/abc123.pdf"
        }"#;

        let result: ProcessingResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.job_id, "abc123");
        assert!(result.was_translated);
        assert_eq!(result.artifact_paths.notes, "notes/abc123.md");
        assert_eq!(result.artifact_paths.audio, "downloads/abc123.mp3");
    }

    #[test]
    fn test_progress_error_is_optional() {
        let body = r#"{
            "video_id": "abc123",
            "current_step": "transcribing",
            "progress_percentage": 40.0,
            "step_description": "Transcribing audio",
            "completed": false
        }"#;

        let status: ProgressStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.error, None);
        assert!(!status.completed);
    }
}
