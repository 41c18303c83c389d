use std::path::{Path, PathBuf};

use crate::api::{ArtifactDownloader, ArtifactKind, ProcessingResult};
use crate::languages::language_name;
use crate::ClientError;

/// How the language flow between detected and final content is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationIndicator {
    /// Arrow flow from detected to target language
    Translated,
    /// Check mark, content kept its original language
    NoTranslationNeeded,
}

impl TranslationIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            TranslationIndicator::Translated => "Translated",
            TranslationIndicator::NoTranslationNeeded => "No translation needed",
        }
    }
}

/// One language shown on the results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageLabel {
    pub name: String,
    pub code: String,
}

impl LanguageLabel {
    fn from_code(code: &str) -> Self {
        Self {
            name: language_name(code),
            code: code.to_uppercase(),
        }
    }
}

/// Outcome of one artifact download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub kind: ArtifactKind,
    pub outcome: Result<PathBuf, ClientError>,
}

impl DownloadReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Everything the results page displays for a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub job_id: String,
    pub detected: LanguageLabel,
    pub target: LanguageLabel,
    pub indicator: TranslationIndicator,
}

impl ResultsView {
    pub fn new(result: &ProcessingResult) -> Self {
        let indicator = if result.was_translated {
            TranslationIndicator::Translated
        } else {
            TranslationIndicator::NoTranslationNeeded
        };

        Self {
            job_id: result.job_id.clone(),
            detected: LanguageLabel::from_code(&result.detected_language),
            target: LanguageLabel::from_code(&result.target_language),
            indicator,
        }
    }

    /// Sentence under the language flow
    pub fn summary(&self) -> String {
        match self.indicator {
            TranslationIndicator::Translated => format!(
                "Content was automatically translated from {} to {}",
                self.detected.name, self.target.name
            ),
            TranslationIndicator::NoTranslationNeeded => format!(
                "Content processed in original language: {}",
                self.detected.name
            ),
        }
    }

    /// Fetch one artifact into `dir`
    pub async fn download(
        &self,
        downloader: &dyn ArtifactDownloader,
        kind: ArtifactKind,
        dir: &Path,
    ) -> DownloadReport {
        let outcome = downloader.download(&self.job_id, kind, dir).await.map_err(|e| {
            tracing::warn!("Download of {} for job {} failed: {}", kind, self.job_id, e);
            match e {
                ClientError::DownloadFailed(_) => e,
                other => ClientError::DownloadFailed(other.to_string()),
            }
        });

        DownloadReport { kind, outcome }
    }

    /// Fetch every artifact; a failed one does not stop the others
    pub async fn download_all(
        &self,
        downloader: &dyn ArtifactDownloader,
        dir: &Path,
    ) -> Vec<DownloadReport> {
        let mut reports = Vec::with_capacity(ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            reports.push(self.download(downloader, kind, dir).await);
        }
        reports
    }
}
