use serde::{Deserialize, Serialize};

use crate::domain::provider::Provider;

/// Terminal status of one provider negotiation.
///
/// `no_availability` is a successful negotiation with a negative result,
/// distinct from `timeout` and `error` which mean the negotiation itself
/// did not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    NoAvailability,
    Timeout,
    Error,
}

/// The result of one provider's negotiation. Produced exactly once per
/// provider per run and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub provider: Provider,
    pub slot: Option<String>,
    /// Call transcript lines, advisory only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok(provider: Provider, slot: impl Into<String>, transcript: Vec<String>) -> Self {
        Self {
            status: OutcomeStatus::Ok,
            provider,
            slot: Some(slot.into()),
            transcript,
            error: None,
        }
    }

    pub fn no_availability(provider: Provider, transcript: Vec<String>) -> Self {
        Self { status: OutcomeStatus::NoAvailability, provider, slot: None, transcript, error: None }
    }

    pub fn timeout(provider: Provider) -> Self {
        Self {
            status: OutcomeStatus::Timeout,
            provider,
            slot: None,
            transcript: Vec::new(),
            error: None,
        }
    }

    pub fn error(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            provider,
            slot: None,
            transcript: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// True when this outcome can enter the ranking: negotiated `ok`
    /// with a concrete slot.
    pub fn is_bookable(&self) -> bool {
        self.status == OutcomeStatus::Ok && self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, OutcomeStatus, Provider};

    fn provider() -> Provider {
        Provider {
            name: "Bright Smile".to_string(),
            service: "dentist".to_string(),
            availability: vec!["09:00".to_string()],
            rating: 4.5,
            distance_miles: 2.0,
            simulated_latency_s: None,
        }
    }

    #[test]
    fn statuses_serialize_as_snake_case() {
        let json = serde_json::to_value(Outcome::no_availability(provider(), Vec::new()))
            .expect("serialize");
        assert_eq!(json["status"], "no_availability");
        assert_eq!(json["slot"], serde_json::Value::Null);
    }

    #[test]
    fn only_ok_with_slot_is_bookable() {
        assert!(Outcome::ok(provider(), "09:00", Vec::new()).is_bookable());
        assert!(!Outcome::no_availability(provider(), Vec::new()).is_bookable());
        assert!(!Outcome::timeout(provider()).is_bookable());
        assert!(!Outcome::error(provider(), "line busy").is_bookable());
    }

    #[test]
    fn error_outcome_preserves_the_failure_text() {
        let outcome = Outcome::error(provider(), "connection reset");
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error.as_deref(), Some("connection reset"));
    }
}
