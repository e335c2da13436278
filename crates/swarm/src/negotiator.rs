use async_trait::async_trait;
use thiserror::Error;

use callpilot_core::{BookingRequest, Outcome, Provider};

/// Failure of one negotiation attempt. The dispatcher converts this
/// into an `error` outcome for that provider; it never propagates.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote agent returned an invalid reply: {0}")]
    InvalidReply(String),
}

/// The negotiation port: given a provider and a request, produce exactly
/// one terminal outcome or fail.
///
/// Implementations must be safe to invoke concurrently for different
/// providers and must not share mutable state between invocations. A
/// call may take unbounded time; the dispatcher imposes the wall-clock
/// bound and may abandon the call at any point.
#[async_trait]
pub trait Negotiator: Send + Sync {
    async fn negotiate(
        &self,
        provider: &Provider,
        request: &BookingRequest,
    ) -> Result<Outcome, NegotiationError>;
}
