use serde::{Deserialize, Serialize};

use callpilot_core::{Outcome, Provider, ScoredCandidate};

/// Progress events produced by a streaming orchestration run.
///
/// Total order for one run: exactly one `start` before any negotiation,
/// one `progress` per provider in completion order, exactly one
/// terminal `complete`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwarmEvent {
    Start {
        provider_count: usize,
        providers: Vec<Provider>,
    },
    Progress {
        outcome: Outcome,
        /// Eagerly computed for `ok` outcomes so a live display can show
        /// a running score before the final ranking lands.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<ScoredCandidate>,
    },
    Complete {
        ranked: Vec<ScoredCandidate>,
        best: Option<ScoredCandidate>,
        /// Present only when the pipeline itself failed; individual
        /// provider failures never set this.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl SwarmEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use callpilot_core::{Outcome, Provider};

    use super::SwarmEvent;

    fn provider() -> Provider {
        Provider {
            name: "Bright Smile".to_string(),
            service: "dentist".to_string(),
            availability: Vec::new(),
            rating: 4.5,
            distance_miles: 2.0,
            simulated_latency_s: None,
        }
    }

    #[test]
    fn events_serialize_with_a_snake_case_type_tag() {
        let start = SwarmEvent::Start { provider_count: 1, providers: vec![provider()] };
        let json = serde_json::to_value(&start).expect("serialize");
        assert_eq!(json["type"], "start");
        assert_eq!(json["provider_count"], 1);

        let progress =
            SwarmEvent::Progress { outcome: Outcome::timeout(provider()), score: None };
        let json = serde_json::to_value(&progress).expect("serialize");
        assert_eq!(json["type"], "progress");
        assert_eq!(json["outcome"]["status"], "timeout");
        assert!(json.get("score").is_none(), "absent score is omitted");

        let complete = SwarmEvent::Complete { ranked: Vec::new(), best: None, error: None };
        let json = serde_json::to_value(&complete).expect("serialize");
        assert_eq!(json["type"], "complete");
        assert_eq!(json["best"], serde_json::Value::Null);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn only_complete_is_terminal() {
        assert!(SwarmEvent::Complete { ranked: Vec::new(), best: None, error: None }.is_terminal());
        assert!(!SwarmEvent::Start { provider_count: 0, providers: Vec::new() }.is_terminal());
    }
}
