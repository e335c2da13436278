pub mod calendar;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ranking;
pub mod scoring;
pub mod slots;

pub use calendar::{BusyInterval, Calendar, CalendarFile};
pub use domain::outcome::{Outcome, OutcomeStatus};
pub use domain::provider::Provider;
pub use domain::request::{BookingRequest, NormalizedWeights, Preferences, TimeWindow};
pub use errors::DomainError;
pub use ranking::{rank, Ranking};
pub use scoring::{score_candidate, ScoreComponents, ScoredCandidate};
