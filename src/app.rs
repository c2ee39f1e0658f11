// src/app.rs

use std::sync::Arc;

use tracing::error;

use crate::config::{Settings, API_KEY_ENV};
use crate::core::error::{ScanError, ScanResult};
use crate::core::scanner::virustotal::VirusTotalClient;
use crate::core::scanner::ReputationService;

/// State shared by every request handler. Immutable after startup.
pub struct AppState {
    pub settings: Settings,
    service: ScanResult<Arc<dyn ReputationService>>,
}

impl AppState {
    /// Builds the state from settings.
    ///
    /// A missing credential or an unbuildable client is remembered rather than
    /// returned, so the server still starts and answers each request with a
    /// configuration error.
    pub fn new(settings: Settings) -> Self {
        let service = match settings.api_key.as_deref() {
            None => Err(ScanError::Configuration(format!("{} is not set", API_KEY_ENV))),
            Some(key) => VirusTotalClient::new(&settings.base_url, key)
                .map(|client| Arc::new(client) as Arc<dyn ReputationService>),
        };
        Self { settings, service }
    }

    /// Builds the state around an already constructed service.
    pub fn with_service(settings: Settings, service: Arc<dyn ReputationService>) -> Self {
        Self { settings, service: Ok(service) }
    }

    /// The reputation service, or the configuration error that prevented building it.
    pub fn service(&self) -> ScanResult<&dyn ReputationService> {
        match &self.service {
            Ok(service) => Ok(service.as_ref()),
            Err(e) => {
                error!(error = %e, "Rejecting request: service is not configured.");
                Err(e.clone())
            }
        }
    }
}
