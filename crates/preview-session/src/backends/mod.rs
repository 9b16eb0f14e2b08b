/// Generation backends abstraction
///
/// Provides the unified interface the session uses to issue one generation
/// request and receive a playable media result or a free-text error.

pub mod veo;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use veo::VeoBackend;

use crate::media::MediaResult;
use crate::request::RequestDescriptor;

/// Generation backend trait
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Run one generation request to completion.
    ///
    /// Errors carry the backend's free-text message so the caller can
    /// classify them.
    async fn generate(&self, request: &RequestDescriptor) -> Result<MediaResult>;
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API endpoint URL
    pub api_url: Option<String>,

    /// API key or token
    pub api_key: Option<String>,

    /// Local directory for downloaded clips
    pub output_dir: PathBuf,

    /// Seconds between operation polls
    pub poll_interval_secs: u64,

    /// Overall timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl BackendConfig {
    /// Create new backend config
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            api_url: None,
            api_key: None,
            output_dir,
            poll_interval_secs: 5,
            timeout_secs: Some(600), // 10 minute default
        }
    }

    /// With API endpoint
    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = Some(url);
        self
    }

    /// With API key
    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = Some(key);
        self
    }

    /// With poll interval
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// With timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Save configuration to JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_builders() {
        let config = BackendConfig::new(PathBuf::from("/tmp/previews"))
            .with_api_key("secret".to_string())
            .with_poll_interval(2)
            .with_timeout(120);

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.timeout_secs, Some(120));
    }

    #[test]
    fn test_backend_config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.json");

        let config = BackendConfig::new(dir.path().to_path_buf())
            .with_api_url("https://example.test/v1".to_string());
        config.save(&path).unwrap();

        let loaded = BackendConfig::load(&path).unwrap();
        assert_eq!(loaded.api_url.as_deref(), Some("https://example.test/v1"));
        assert_eq!(loaded.output_dir, dir.path());
    }
}
