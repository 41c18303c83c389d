use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::api::ProcessingRequest;
use crate::languages;

/// Accepted video URL shapes: optional scheme, optional `www.`, a watch or short link, then
/// an 11 character video id. Anything after the id is tolerated.
static VIDEO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})")
        .expect("video URL pattern is valid")
});

pub const URL_REQUIRED: &str = "URL is required";
pub const URL_INVALID: &str = "Please enter a valid URL";
pub const LANGUAGE_UNSUPPORTED: &str = "Unsupported target language";

/// Backend processing profile
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    /// Fast processing, good accuracy
    Small,
    /// Balanced speed and accuracy
    #[default]
    Base,
    /// Better accuracy, slower processing
    Medium,
    /// Best accuracy, slowest processing
    Large,
}

impl ModelSize {
    pub const ALL: [ModelSize; 4] = [
        ModelSize::Small,
        ModelSize::Base,
        ModelSize::Medium,
        ModelSize::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Small => "small",
            ModelSize::Base => "base",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelSize::Small => "Small",
            ModelSize::Base => "Base",
            ModelSize::Medium => "Medium",
            ModelSize::Large => "Large",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelSize::Small => "Fast processing, good accuracy",
            ModelSize::Base => "Balanced speed and accuracy",
            ModelSize::Medium => "Better accuracy, slower processing",
            ModelSize::Large => "Best accuracy, slowest processing",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(ModelSize::Small),
            "base" => Ok(ModelSize::Base),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => anyhow::bail!("Unknown model size: {}", other),
        }
    }
}

/// Editable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    SourceUrl,
    ModelSize,
    TargetLanguage,
}

impl FormField {
    /// Name of the field on the wire
    pub fn name(&self) -> &'static str {
        match self {
            FormField::SourceUrl => "youtube_url",
            FormField::ModelSize => "model_size",
            FormField::TargetLanguage => "target_language",
        }
    }
}

/// Field name to error message; empty means the form is valid
pub type FormErrors = BTreeMap<FormField, String>;

/// User-entered processing options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    source_url: String,
    model_size: ModelSize,
    target_language: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            model_size: ModelSize::default(),
            target_language: "en".to_string(),
        }
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from configured defaults instead of the built-in ones
    pub fn with_defaults(model_size: ModelSize, target_language: impl Into<String>) -> Self {
        Self {
            source_url: String::new(),
            model_size,
            target_language: target_language.into(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn model_size(&self) -> ModelSize {
        self.model_size
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn set_source_url(&mut self, url: impl Into<String>) {
        self.source_url = url.into();
    }

    pub fn set_model_size(&mut self, model_size: ModelSize) {
        self.model_size = model_size;
    }

    pub fn set_target_language(&mut self, code: impl Into<String>) {
        self.target_language = code.into();
    }

    /// Check every field and collect the messages to show next to them
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        if self.source_url.is_empty() {
            errors.insert(FormField::SourceUrl, URL_REQUIRED.to_string());
        } else if !is_valid_video_url(&self.source_url) {
            errors.insert(FormField::SourceUrl, URL_INVALID.to_string());
        }

        if !languages::is_supported_target(&self.target_language) {
            errors.insert(FormField::TargetLanguage, LANGUAGE_UNSUPPORTED.to_string());
        }

        errors
    }

    /// Snapshot the form into a request if it validates
    pub fn submit(&self) -> Result<ProcessingRequest, FormErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!("Form rejected: {:?}", errors);
            return Err(errors);
        }

        if let Some(video_id) = extract_video_id(&self.source_url) {
            tracing::debug!("Form accepted for video {}", video_id);
        }

        Ok(ProcessingRequest {
            youtube_url: self.source_url.clone(),
            model_size: self.model_size,
            target_language: self.target_language.clone(),
        })
    }
}

/// Check whether a string looks like a YouTube watch or short link
pub fn is_valid_video_url(url: &str) -> bool {
    VIDEO_URL_PATTERN.is_match(url)
}

/// Pull the 11 character video id out of an accepted URL
pub fn extract_video_id(url: &str) -> Option<&str> {
    VIDEO_URL_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(4))
        .map(|m| m.as_str())
}
