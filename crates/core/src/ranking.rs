//! Aggregation of heterogeneous negotiation outcomes into a ranked list.

use serde::{Deserialize, Serialize};

use crate::domain::outcome::Outcome;
use crate::domain::request::BookingRequest;
use crate::scoring::{score_candidate, ScoredCandidate};

/// The ranked result of one orchestration run. `best` is the head of
/// `ranked`, or `None` when no provider produced a bookable outcome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub ranked: Vec<ScoredCandidate>,
    pub best: Option<ScoredCandidate>,
}

/// Filter outcomes to bookable ones, score each, and sort descending by
/// score. The sort is stable: candidates with equal scores keep the
/// order in which their outcomes arrived. Pure and deterministic.
pub fn rank(outcomes: &[Outcome], request: &BookingRequest) -> Ranking {
    let mut ranked: Vec<ScoredCandidate> = outcomes
        .iter()
        .filter(|outcome| outcome.is_bookable())
        .map(|outcome| score_candidate(outcome, request))
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let best = ranked.first().cloned();
    Ranking { ranked, best }
}
