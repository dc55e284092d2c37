//! Loading studio configuration (content API location + seed admin configs) from TOML.
//!
//! See `StudioConfig` for the expected schema. Environment variables override the file.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::admin::PromptConfig;

pub const DEFAULT_STUDENT_NEEDS: &str = "general_difficulty";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Origin of the content API, without a trailing slash.
    pub api_base_url: String,
    pub generate_path: String,
    pub adapt_path: String,
    /// None leaves the transport's own default in place.
    pub request_timeout_secs: Option<u64>,
    /// Hint sent with every adaptation request.
    pub student_needs: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub prompt_configs: Vec<PromptConfig>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5001".into(),
            generate_path: "/api/generate".into(),
            adapt_path: "/api/adapt".into(),
            request_timeout_secs: None,
            student_needs: DEFAULT_STUDENT_NEEDS.into(),
            port: 3000,
            static_dir: PathBuf::from("./static"),
            prompt_configs: Vec::new(),
        }
    }
}

impl StudioConfig {
    pub fn from_toml_str(path: &str, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str::<StudioConfig>(raw).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
        Self::from_toml_str(path, &raw)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// Apply env overrides from any `key -> value` lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("LESSON_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(e) => warn!(target: "lesson_studio", value = %v, error = %e, "Ignoring invalid PORT"),
            }
        }
        if let Some(v) = lookup("LESSON_API_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(e) => warn!(target: "lesson_studio", value = %v, error = %e, "Ignoring invalid LESSON_API_TIMEOUT_SECS"),
            }
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
    }
}

/// Load from STUDIO_CONFIG_PATH (if set) and apply env overrides.
/// On any IO/parse error the defaults are used.
pub fn load_studio_config_from_env() -> StudioConfig {
    let mut cfg = match std::env::var("STUDIO_CONFIG_PATH") {
        Ok(path) => match StudioConfig::from_file(&path) {
            Ok(cfg) => {
                info!(target: "lesson_studio", %path, prompt_configs = cfg.prompt_configs.len(), "Loaded studio config (TOML)");
                cfg
            }
            Err(e) => {
                error!(target: "lesson_studio", %path, error = %e, "Failed to load studio config; using defaults");
                StudioConfig::default()
            }
        },
        Err(_) => StudioConfig::default(),
    };
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg
}
