//! Deterministic multi-factor scoring of successful negotiation outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::outcome::Outcome;
use crate::domain::provider::Provider;
use crate::domain::request::{BookingRequest, TimeWindow};
use crate::slots::{parse_slot, window_bounds};

/// Reference radius for the distance component: a provider 10 miles out
/// has fully decayed to the floor.
const DISTANCE_REFERENCE_MILES: f64 = 10.0;

/// Individual score contributions, each normalized into [0, 1] before
/// the preference weights are applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub time: f64,
    pub rating: f64,
    pub distance: f64,
}

/// A successful outcome annotated with its comparable score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub provider: Provider,
    pub slot: Option<String>,
    pub score: f64,
    pub components: ScoreComponents,
}

/// Score one `ok` outcome against the caller's preferences.
///
/// Pure and deterministic: identical outcome + request pairs always
/// produce identical scores. Malformed slot or window strings degrade to
/// the zero / missing-bound branches rather than failing. Score and
/// components are rounded to three decimals for display stability.
pub fn score_candidate(outcome: &Outcome, request: &BookingRequest) -> ScoredCandidate {
    let weights = request.weights();

    let time = time_component(outcome.slot.as_deref(), request.time_window.as_ref());
    let rating = (outcome.provider.rating / 5.0).min(1.0);
    let distance =
        (1.0 - (outcome.provider.distance_miles / DISTANCE_REFERENCE_MILES).min(1.0)).max(0.1);

    let score = weights.time * time + weights.rating * rating + weights.distance * distance;

    ScoredCandidate {
        provider: outcome.provider.clone(),
        slot: outcome.slot.clone(),
        score: round3(score),
        components: ScoreComponents {
            time: round3(time),
            rating: round3(rating),
            distance: round3(distance),
        },
    }
}

/// Position-in-window time reward.
///
/// No slot scores 0; no window at all gives a flat 0.6 (any slot is
/// mildly rewarded); a slot outside the window scores 0; a half-open
/// window gives 0.7; inside a closed window the reward decays linearly
/// from 1.0 at the window start, floored at 0.2.
fn time_component(slot: Option<&str>, window: Option<&TimeWindow>) -> f64 {
    let Some(slot) = slot else {
        return 0.0;
    };
    let Some(window) = window else {
        return 0.6;
    };

    let (start, end) = window_bounds(window);
    let Some(slot_at) = parse_slot(slot, window.date.as_deref()) else {
        return 0.0;
    };

    if start.is_some_and(|bound| slot_at < bound) {
        return 0.0;
    }
    if end.is_some_and(|bound| slot_at > bound) {
        return 0.0;
    }

    let (Some(start), Some(end)) = (start, end) else {
        return 0.7;
    };

    let total = (end - start).num_seconds();
    if total <= 0 {
        return 0.7;
    }

    let position = (slot_at - start).num_seconds() as f64 / total as f64;
    (1.0 - position).max(0.2)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
