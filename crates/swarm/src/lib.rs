//! Concurrent fan-out/fan-in orchestration of provider negotiations.
//!
//! One orchestration run dispatches a single booking request to many
//! independent providers at once, bounded by a semaphore admission cap
//! and a per-task timeout. Each negotiation resolves to exactly one
//! terminal [`Outcome`](callpilot_core::Outcome); failures and timeouts
//! are isolated per task and never abort the run. Successful outcomes
//! are scored and ranked, either after the fact (batch mode) or live as
//! an event stream.
//!
//! The actual negotiation transport is behind the [`Negotiator`] trait;
//! this crate never cares whether a call is an in-process simulation or
//! a network round trip.

pub mod dispatcher;
pub mod events;
pub mod negotiator;
pub mod orchestrator;

pub use dispatcher::{dispatch, SwarmLimits};
pub use events::SwarmEvent;
pub use negotiator::{NegotiationError, Negotiator};
pub use orchestrator::{orchestrate, orchestrate_stream, SwarmOutcome};
