use std::sync::Arc;

use anyhow::Context;

use crate::ai::{ChatClient, CompletionBackend, SummaryGateway};
use crate::config::Config;
use crate::error::ConfigError;
use crate::text::Scrubber;

/// Shared, read-only per-process state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub gateway: SummaryGateway,
    pub scrubber: Scrubber,
}

impl AppState {
    /// Validate configuration and build the state. Fails when the API key is missing,
    /// so the listener is never bound without one.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.ai.require_api_key()?;
        let client = ChatClient::new(&config.ai, api_key)
            .context("Failed to build summarization client")?;
        tracing::info!(
            endpoint = %config.ai.endpoint,
            model = %config.ai.model,
            "Summarization client configured"
        );

        Ok(Self::with_backend(Arc::new(client), config)?)
    }

    pub fn with_backend(
        backend: Arc<dyn CompletionBackend>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            gateway: SummaryGateway::new(backend, &config.ai),
            scrubber: Scrubber::new(&config.scrub)?,
        })
    }
}
