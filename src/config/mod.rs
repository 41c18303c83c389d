use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::form::ModelSize;
use crate::languages;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Processing backend connection
    pub backend: BackendConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL the `/api/...` paths are appended to
    pub base_url: String,

    /// Timeout for the processing request, in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pause between a finished request and the results page, in milliseconds
    pub display_delay_ms: u64,

    /// Where downloaded artifacts are saved (current directory if unset)
    pub download_dir: Option<PathBuf>,

    /// Model size preselected in the form
    pub default_model_size: ModelSize,

    /// Target language preselected in the form
    pub default_target_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8000".to_string(),
                request_timeout_secs: 300,
            },
            app: AppConfig {
                display_delay_ms: 500,
                download_dir: None,
                default_model_size: ModelSize::Base,
                default_target_language: "en".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading configuration from {}", config_path.display());
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;
            Self::from_yaml(&content)
        } else {
            tracing::debug!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // A project-local file wins over the user config
        let local_config = PathBuf::from("vidnotes.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("vidnotes").join("config.yaml"))
    }

    /// Point the client at a different backend
    pub fn with_backend_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.backend.base_url = base_url.into();
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.backend.base_url)
            .with_context(|| format!("Invalid backend URL: {}", self.backend.base_url))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Backend URL must use HTTP or HTTPS protocol");
        }

        if self.backend.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be greater than zero");
        }

        if !languages::is_supported_target(&self.app.default_target_language) {
            anyhow::bail!(
                "Unsupported default target language: {}",
                self.app.default_target_language
            );
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Backend URL: {}", self.backend.base_url);
        println!("  Request Timeout: {}s", self.backend.request_timeout_secs);
        println!("  Display Delay: {}ms", self.app.display_delay_ms);
        match &self.app.download_dir {
            Some(dir) => println!("  Download Directory: {}", dir.display()),
            None => println!("  Download Directory: (current directory)"),
        }
        println!("  Default Model Size: {}", self.app.default_model_size);
        println!("  Default Target Language: {}", self.app.default_target_language);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.app.display_delay_ms)
    }

    /// Directory downloads are written into
    pub fn download_dir(&self) -> Result<PathBuf> {
        match &self.app.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Could not determine current directory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.display_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
backend:
  base_url: https://notes.example.com
  request_timeout_secs: 60
app:
  display_delay_ms: 0
  download_dir: /tmp/notes
  default_model_size: medium
  default_target_language: fr
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.backend.base_url, "https://notes.example.com");
        assert_eq!(config.app.default_model_size, ModelSize::Medium);
        assert_eq!(config.download_dir().unwrap(), PathBuf::from("/tmp/notes"));
    }

    #[test]
    fn test_rejects_bad_backend_url() {
        assert!(Config::default().with_backend_url("not a url").is_err());
        assert!(Config::default().with_backend_url("ftp://example.com").is_err());
        assert!(Config::default().with_backend_url("http://10.0.0.2:9000").is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsupported_default_language() {
        let mut config = Config::default();
        config.app.default_target_language = "it".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_keeps_values() {
        let mut config = Config::default();
        config.app.display_delay_ms = 125;

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.app.display_delay_ms, 125);
    }
}
