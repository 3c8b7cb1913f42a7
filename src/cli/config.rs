use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::backend::{BackendTimeouts, RequestMetadata};

/// Configuration for the writing coach front-end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
    /// How to reach the evaluation backend
    #[serde(default)]
    pub backend: BackendSettings,

    /// Chat UI behavior
    #[serde(default)]
    pub ui: UiSettings,
}

/// Evaluation backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the evaluation service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `user_id` sent with every evaluation
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// `title` sent with text evaluations
    #[serde(default = "default_text_title")]
    pub text_title: String,

    /// `title` sent with image evaluations
    #[serde(default = "default_image_title")]
    pub image_title: String,

    /// Request timeouts
    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: default_user_id(),
            text_title: default_text_title(),
            image_title: default_image_title(),
            timeouts: TimeoutSettings::default(),
        }
    }
}

impl BackendSettings {
    pub fn text_metadata(&self) -> RequestMetadata {
        RequestMetadata::new(&self.user_id, &self.text_title)
    }

    pub fn image_metadata(&self) -> RequestMetadata {
        RequestMetadata::new(&self.user_id, &self.image_title)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_id() -> String {
    "writing_coach_user".to_string()
}

fn default_text_title() -> String {
    "Writing Coach Chat".to_string()
}

fn default_image_title() -> String {
    "Writing Coach Image Upload".to_string()
}

/// Timeouts in seconds for each backend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_evaluate_secs")]
    pub evaluate_secs: u64,

    #[serde(default = "default_image_secs")]
    pub image_secs: u64,

    #[serde(default = "default_health_secs")]
    pub health_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            evaluate_secs: default_evaluate_secs(),
            image_secs: default_image_secs(),
            health_secs: default_health_secs(),
        }
    }
}

impl TimeoutSettings {
    pub fn to_timeouts(&self) -> BackendTimeouts {
        BackendTimeouts {
            evaluate: Duration::from_secs(self.evaluate_secs),
            image: Duration::from_secs(self.image_secs),
            health: Duration::from_secs(self.health_secs),
        }
    }
}

fn default_evaluate_secs() -> u64 {
    60
}

fn default_image_secs() -> u64 {
    120
}

fn default_health_secs() -> u64 {
    5
}

/// Chat UI settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Delay between revealed words of the intro (0 disables the effect)
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Largest accepted upload in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Sessions untouched for this long are discarded
    #[serde(default = "default_session_idle_mins")]
    pub session_idle_mins: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay_ms(),
            max_upload_mb: default_max_upload_mb(),
            session_idle_mins: default_session_idle_mins(),
        }
    }
}

impl UiSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_mins * 60)
    }
}

fn default_typing_delay_ms() -> u64 {
    20
}

fn default_max_upload_mb() -> usize {
    20
}

fn default_session_idle_mins() -> u64 {
    60
}

impl CoachConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: CoachConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Load from `path` if given, otherwise use defaults, then apply the
    /// backend URL override
    pub fn resolve(path: Option<&Path>, backend_url: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(url) = backend_url {
            config.backend.base_url = url.to_string();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoachConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeouts.to_timeouts(), BackendTimeouts::default());
        assert_eq!(config.ui.typing_delay_ms, 20);
        assert_eq!(config.ui.max_upload_bytes(), 20 * 1024 * 1024);
        assert_eq!(config.ui.session_idle(), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "backend:\n  base_url: http://coach:9000\n  timeouts:\n    image_secs: 30\n";
        let config: CoachConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.backend.base_url, "http://coach:9000");
        assert_eq!(config.backend.user_id, "writing_coach_user");
        assert_eq!(config.backend.timeouts.image_secs, 30);
        assert_eq!(config.backend.timeouts.evaluate_secs, 60);
        assert_eq!(config.ui, UiSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writing-coach.yaml");

        let mut config = CoachConfig::default();
        config.ui.typing_delay_ms = 0;
        config.save(&path).unwrap();

        let loaded = CoachConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_resolve_applies_override() {
        let config = CoachConfig::resolve(None, Some("http://127.0.0.1:8001")).unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8001");
        assert_eq!(config.backend.text_metadata().title, "Writing Coach Chat");
        assert_eq!(config.backend.image_metadata().title, "Writing Coach Image Upload");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CoachConfig::load(dir.path().join("absent.yaml")).is_err());
    }
}
