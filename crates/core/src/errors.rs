use thiserror::Error;

/// Failures that reject a booking request before any negotiation starts.
///
/// Per-provider negotiation failures are never errors at this level; they
/// surface as `Outcome` values with a `timeout` or `error` status.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("request validation failed: service must not be empty")]
    MissingService,
    #[error("request validation failed: {weight} must be a finite, non-negative number (got {value})")]
    InvalidWeight { weight: &'static str, value: f64 },
}
