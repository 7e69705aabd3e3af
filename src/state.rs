//! # Application State
//!
//! Shared, read-only state handed to every request handler through `web::Data`.
//! The configuration is loaded once at startup and never changes afterwards, so
//! everything is shared through plain `Arc`s.

use crate::config::AppConfig;
use crate::services::{AudioService, ConnectivityProbes};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Startup configuration, immutable for the process lifetime
    pub config: Arc<AppConfig>,

    /// Transcribe/polish orchestrator
    pub audio: Arc<AudioService>,

    /// Upstream reachability checks for `GET /api/config`
    pub probes: Arc<ConnectivityProbes>,
}

impl AppState {
    /// Build every service from the configuration.
    pub fn new(config: AppConfig) -> Self {
        let audio = AudioService::from_config(&config);
        let probes = ConnectivityProbes::from_config(&config);
        Self::with_services(config, audio, probes)
    }

    /// Assemble the state from pre-built services (tests swap in fakes here).
    pub fn with_services(
        config: AppConfig,
        audio: AudioService,
        probes: ConnectivityProbes,
    ) -> Self {
        Self {
            config: Arc::new(config),
            audio: Arc::new(audio),
            probes: Arc::new(probes),
        }
    }

    pub fn mock_mode(&self) -> bool {
        self.config.mock.enabled
    }
}
