use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tracing::info;

use callpilot_agent::negotiator_from_config;
use callpilot_core::config::{AppConfig, ConfigError, LoadOptions};
use callpilot_swarm::Negotiator;

use crate::providers::ProviderStore;
use crate::{health, routes};

/// Shared per-request state: the effective configuration, the provider
/// store, and the negotiation transport chosen at construction time.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: ProviderStore,
    pub negotiator: Arc<dyn Negotiator>,
}

pub struct Application {
    pub config: Arc<AppConfig>,
    state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("negotiation transport construction failed: {0}")]
    Negotiator(String),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        agent_mode = ?config.agent.mode,
        providers_path = %config.data.providers_path.display(),
        "starting application bootstrap"
    );

    let negotiator = negotiator_from_config(&config)
        .map_err(|error| BootstrapError::Negotiator(error.to_string()))?;
    let store = ProviderStore::new(config.data.providers_path.clone());
    let config = Arc::new(config);

    let state = AppState { config: Arc::clone(&config), store, negotiator };
    Ok(Application { config, state })
}

impl Application {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(routes::index))
            .route("/health", get(health::health))
            .route("/swarm", post(routes::swarm))
            .route("/swarm/stream", post(routes::swarm_stream))
            .route("/calendar", get(routes::get_calendar))
            .route("/check-calendar", post(routes::check_calendar))
            .with_state(self.state.clone())
    }

    #[cfg(test)]
    pub fn state(&self) -> AppState {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use callpilot_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[test]
    fn bootstrap_builds_the_simulated_transport_from_defaults() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                providers_path: Some("does-not-exist/providers.json".into()),
                calendar_path: Some("does-not-exist/calendar.json".into()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed with defaults");

        // A missing calendar file degrades to an empty calendar rather
        // than failing bootstrap.
        assert_eq!(app.config.swarm.max_concurrency, 5);
    }

    #[test]
    fn bootstrap_fails_fast_on_invalid_config() {
        let mut config = AppConfig::default();
        config.swarm.max_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
