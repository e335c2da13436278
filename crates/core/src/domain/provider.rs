use serde::{Deserialize, Serialize};

fn default_distance_miles() -> f64 {
    10.0
}

/// A candidate business the swarm negotiates with. Read-only input to
/// the orchestration run; the `name` is a display key and is not
/// guaranteed globally unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub service: String,
    /// Slot strings, either full `YYYY-MM-DD HH:MM` timestamps or bare
    /// `HH:MM` times anchored to the request's window date.
    #[serde(default)]
    pub availability: Vec<String>,
    /// Star rating in 0..=5.
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "default_distance_miles")]
    pub distance_miles: f64,
    /// Artificial negotiation latency used by the simulated transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_latency_s: Option<f64>,
}

impl Provider {
    pub fn matches_service(&self, service: &str) -> bool {
        self.service == service
    }
}

#[cfg(test)]
mod tests {
    use super::Provider;

    #[test]
    fn missing_optional_fields_take_defaults() {
        let provider: Provider =
            serde_json::from_str(r#"{"name": "Bright Smile", "service": "dentist"}"#)
                .expect("deserialize");

        assert!(provider.availability.is_empty());
        assert_eq!(provider.rating, 0.0);
        assert_eq!(provider.distance_miles, 10.0);
        assert_eq!(provider.simulated_latency_s, None);
    }
}
