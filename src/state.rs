//! Application state shared by the HTTP and WebSocket handlers.
//!
//! This module owns:
//!   - the studio (both workflows and their snapshot)
//!   - the admin prompt-config store
//!   - the loaded configuration

use std::sync::Arc;

use tracing::{info, instrument};

use crate::admin::AdminStore;
use crate::config::StudioConfig;
use crate::studio::Studio;
use crate::transport::{HttpLessonApi, LessonApi};

#[derive(Clone)]
pub struct AppState {
    pub studio: Studio,
    pub admin: AdminStore,
    pub config: Arc<StudioConfig>,
}

impl AppState {
    /// Build state against the real content API described by `cfg`.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: StudioConfig) -> Result<Self, reqwest::Error> {
        let api = HttpLessonApi::from_config(&cfg)?;
        info!(
            target: "lesson_studio",
            base_url = %api.base_url,
            generate_path = %api.generate_path,
            adapt_path = %api.adapt_path,
            timeout_secs = ?cfg.request_timeout_secs,
            "Content API client ready"
        );
        Ok(Self::with_api(cfg, Arc::new(api)))
    }

    pub fn with_api(cfg: StudioConfig, api: Arc<dyn LessonApi>) -> Self {
        let needs = Some(cfg.student_needs.clone()).filter(|n| !n.trim().is_empty());
        Self {
            studio: Studio::new(api, needs),
            admin: AdminStore::seeded(&cfg.prompt_configs),
            config: Arc::new(cfg),
        }
    }
}
