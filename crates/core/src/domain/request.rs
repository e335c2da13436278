use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const DEFAULT_TIME_WEIGHT: f64 = 0.6;
pub const DEFAULT_RATING_WEIGHT: f64 = 0.2;
pub const DEFAULT_DISTANCE_WEIGHT: f64 = 0.2;

/// Caller-requested date/start/end constraint. All fields are local
/// wall-clock strings (`YYYY-MM-DD` date, `HH:MM` times); any of them
/// may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Scoring weights supplied by the caller. Missing fields fall back to
/// the 0.6 / 0.2 / 0.2 defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_time_weight")]
    pub time_weight: f64,
    #[serde(default = "default_rating_weight")]
    pub rating_weight: f64,
    #[serde(default = "default_distance_weight")]
    pub distance_weight: f64,
}

fn default_time_weight() -> f64 {
    DEFAULT_TIME_WEIGHT
}

fn default_rating_weight() -> f64 {
    DEFAULT_RATING_WEIGHT
}

fn default_distance_weight() -> f64 {
    DEFAULT_DISTANCE_WEIGHT
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            time_weight: DEFAULT_TIME_WEIGHT,
            rating_weight: DEFAULT_RATING_WEIGHT,
            distance_weight: DEFAULT_DISTANCE_WEIGHT,
        }
    }
}

/// Weights clamped non-negative and normalized to sum to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedWeights {
    pub time: f64,
    pub rating: f64,
    pub distance: f64,
}

impl Preferences {
    /// Clamp each weight to zero or above and divide by the sum. A zero
    /// sum falls back to a divisor of one so normalization never divides
    /// by zero.
    pub fn normalized(&self) -> NormalizedWeights {
        let time = self.time_weight.max(0.0);
        let rating = self.rating_weight.max(0.0);
        let distance = self.distance_weight.max(0.0);

        let mut total = time + rating + distance;
        if total == 0.0 {
            total = 1.0;
        }

        NormalizedWeights { time: time / total, rating: rating / total, distance: distance / total }
    }

    fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("time_weight", self.time_weight),
            ("rating_weight", self.rating_weight),
            ("distance_weight", self.distance_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidWeight { weight: name, value });
            }
        }
        Ok(())
    }
}

/// The caller's booking intent. Immutable for the duration of one
/// orchestration run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl BookingRequest {
    /// Boundary validation, run once before dispatch. Everything past
    /// this point treats the request as well-formed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.service.trim().is_empty() {
            return Err(DomainError::MissingService);
        }
        if let Some(preferences) = &self.preferences {
            preferences.validate()?;
        }
        Ok(())
    }

    /// Effective scoring weights, defaulting when the caller supplied none.
    pub fn weights(&self) -> NormalizedWeights {
        self.preferences.unwrap_or_default().normalized()
    }

    /// The window date used to anchor bare `HH:MM` slot strings.
    pub fn date_hint(&self) -> Option<&str> {
        self.time_window.as_ref().and_then(|window| window.date.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{BookingRequest, Preferences, TimeWindow};
    use crate::errors::DomainError;

    #[test]
    fn default_weights_normalize_to_the_documented_split() {
        let weights = BookingRequest { service: "dentist".to_string(), ..Default::default() }
            .weights();

        assert!((weights.time - 0.6).abs() < 1e-9);
        assert!((weights.rating - 0.2).abs() < 1e-9);
        assert!((weights.distance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn arbitrary_non_negative_weights_sum_to_one() {
        let weights = Preferences { time_weight: 3.0, rating_weight: 1.0, distance_weight: 4.0 }
            .normalized();

        assert!((weights.time + weights.rating + weights.distance - 1.0).abs() < 1e-9);
        assert!((weights.time - 0.375).abs() < 1e-9);
    }

    #[test]
    fn all_zero_weights_do_not_divide_by_zero() {
        let weights = Preferences { time_weight: 0.0, rating_weight: 0.0, distance_weight: 0.0 }
            .normalized();

        assert_eq!(weights.time, 0.0);
        assert_eq!(weights.rating, 0.0);
        assert_eq!(weights.distance, 0.0);
    }

    #[test]
    fn negative_weights_are_clamped_before_normalization() {
        let weights = Preferences { time_weight: -2.0, rating_weight: 1.0, distance_weight: 1.0 }
            .normalized();

        assert_eq!(weights.time, 0.0);
        assert!((weights.rating - 0.5).abs() < 1e-9);
    }

    #[test]
    fn blank_service_fails_validation() {
        let request = BookingRequest { service: "   ".to_string(), ..Default::default() };
        assert_eq!(request.validate(), Err(DomainError::MissingService));
    }

    #[test]
    fn nan_weight_fails_validation() {
        let request = BookingRequest {
            service: "dentist".to_string(),
            preferences: Some(Preferences { time_weight: f64::NAN, ..Preferences::default() }),
            ..Default::default()
        };

        assert!(matches!(
            request.validate(),
            Err(DomainError::InvalidWeight { weight: "time_weight", .. })
        ));
    }

    #[test]
    fn request_round_trips_through_json_with_optional_fields_absent() {
        let request = BookingRequest {
            service: "dentist".to_string(),
            time_window: Some(TimeWindow {
                date: Some("2026-02-08".to_string()),
                start: Some("09:00".to_string()),
                end: None,
            }),
            preferences: None,
        };

        let json = serde_json::to_string(&request).expect("serialize");
        assert!(!json.contains("preferences"));
        assert!(!json.contains("\"end\""));

        let parsed: BookingRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, request);
    }
}
