//! Negotiation over HTTP against a remote voice-agent service.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use callpilot_core::{BookingRequest, Outcome, Provider};
use callpilot_swarm::{NegotiationError, Negotiator};

/// Wire request: the provider under negotiation plus the caller's
/// original booking request.
#[derive(Debug, Serialize)]
struct NegotiationCall<'a> {
    provider: &'a Provider,
    request: &'a BookingRequest,
}

/// Wire reply from the remote agent. The booked slot is a structured
/// field; the agent contract does not embed booking markers in
/// transcript text.
#[derive(Debug, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub booked_slot: Option<String>,
    #[serde(default)]
    pub transcript: Vec<String>,
}

/// HTTP negotiation transport. One POST per provider; the remote call
/// is additionally bounded by the client's own request timeout so a
/// dead endpoint fails before the swarm's per-task deadline.
#[derive(Clone)]
pub struct HttpNegotiator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpNegotiator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<SecretString>,
        request_timeout: Duration,
    ) -> Result<Self, NegotiationError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| NegotiationError::Transport(error.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into(), api_key })
    }
}

#[async_trait]
impl Negotiator for HttpNegotiator {
    async fn negotiate(
        &self,
        provider: &Provider,
        request: &BookingRequest,
    ) -> Result<Outcome, NegotiationError> {
        let mut call = self
            .client
            .post(&self.endpoint)
            .json(&NegotiationCall { provider, request });
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key.expose_secret());
        }

        let response = call
            .send()
            .await
            .map_err(|error| NegotiationError::Transport(error.to_string()))?
            .error_for_status()
            .map_err(|error| NegotiationError::Transport(error.to_string()))?;

        let reply: AgentReply = response
            .json()
            .await
            .map_err(|error| NegotiationError::InvalidReply(error.to_string()))?;

        Ok(outcome_from_reply(provider, reply))
    }
}

/// Map the structured reply into an outcome: a booked slot means `ok`,
/// no slot means the negotiation completed without availability.
fn outcome_from_reply(provider: &Provider, reply: AgentReply) -> Outcome {
    match reply.booked_slot {
        Some(slot) => Outcome::ok(provider.clone(), slot, reply.transcript),
        None => Outcome::no_availability(provider.clone(), reply.transcript),
    }
}
