//! Negotiation transports for the booking swarm.
//!
//! Two implementations of the swarm's [`Negotiator`] port:
//!
//! - [`SimulatedNegotiator`] negotiates in-process against the
//!   provider's published availability, filtered by the user's busy
//!   calendar, with an artificial latency so demos behave like real
//!   calls.
//! - [`HttpNegotiator`] hands the call to a remote voice-agent service
//!   and maps its structured reply back into an outcome.
//!
//! Which one an orchestrator gets is an explicit configuration decision
//! made at construction time (`agent.mode`); nothing in here reads
//! ambient process state.

pub mod http;
pub mod simulated;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use callpilot_core::calendar::Calendar;
use callpilot_core::config::{AgentMode, AppConfig};
use callpilot_swarm::Negotiator;

pub use http::HttpNegotiator;
pub use simulated::SimulatedNegotiator;

/// Build the negotiation transport selected by the configuration.
pub fn negotiator_from_config(config: &AppConfig) -> Result<Arc<dyn Negotiator>> {
    match config.agent.mode {
        AgentMode::Simulated => {
            let calendar = Calendar::load(&config.data.calendar_path);
            Ok(Arc::new(SimulatedNegotiator::new(calendar)))
        }
        AgentMode::Http => {
            let endpoint = config
                .agent
                .endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("agent.endpoint is required for http mode"))?;
            let negotiator = HttpNegotiator::new(
                endpoint,
                config.agent.api_key.clone(),
                Duration::from_secs(config.agent.request_timeout_secs),
            )?;
            Ok(Arc::new(negotiator))
        }
    }
}
