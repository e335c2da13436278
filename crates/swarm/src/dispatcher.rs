//! The swarm dispatcher: one task per provider, semaphore admission,
//! per-task timeout, completion-order collection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use uuid::Uuid;

use callpilot_core::config::SwarmConfig;
use callpilot_core::{BookingRequest, Outcome, Provider};

use crate::negotiator::Negotiator;

/// Bounds for one orchestration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwarmLimits {
    /// Simultaneously active negotiations; additional tasks wait for a
    /// slot. Must be at least 1.
    pub max_concurrency: usize,
    /// Wall-clock bound per provider negotiation.
    pub per_task_timeout: Duration,
}

impl Default for SwarmLimits {
    fn default() -> Self {
        Self { max_concurrency: 5, per_task_timeout: Duration::from_secs(25) }
    }
}

impl From<&SwarmConfig> for SwarmLimits {
    fn from(config: &SwarmConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            per_task_timeout: config.negotiation_timeout(),
        }
    }
}

/// Fan out one negotiation task per provider and return the channel the
/// outcomes arrive on, in completion order.
///
/// The admission permit is acquired before the negotiation starts and
/// released the moment the task's outcome is determined. A negotiation
/// that exceeds the timeout is abandoned and synthesized into a
/// `timeout` outcome; an `Err` from the negotiator becomes an `error`
/// outcome with the failure text preserved. The channel has capacity for
/// every provider, so no task ever blocks on a slow or departed
/// consumer.
pub fn spawn_swarm(
    negotiator: Arc<dyn Negotiator>,
    request: Arc<BookingRequest>,
    providers: Vec<Provider>,
    limits: SwarmLimits,
    run_id: Uuid,
) -> mpsc::Receiver<Outcome> {
    let (tx, rx) = mpsc::channel(providers.len().max(1));
    let semaphore = Arc::new(Semaphore::new(limits.max_concurrency.max(1)));

    for provider in providers {
        let negotiator = Arc::clone(&negotiator);
        let request = Arc::clone(&request);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // The semaphore is never closed while tasks are alive;
                    // synthesize an error rather than dropping the provider.
                    let _ = tx
                        .send(Outcome::error(provider, "admission semaphore closed"))
                        .await;
                    return;
                }
            };

            let started = Instant::now();
            let result = tokio::time::timeout(
                limits.per_task_timeout,
                negotiator.negotiate(&provider, &request),
            )
            .await;
            // Admission is released once the outcome is determined, not
            // after any cleanup of an abandoned call.
            drop(permit);

            let outcome = match result {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(error)) => {
                    tracing::warn!(
                        event_name = "swarm.task.error",
                        run_id = %run_id,
                        provider = %provider.name,
                        error = %error,
                        "provider negotiation failed"
                    );
                    Outcome::error(provider, error.to_string())
                }
                Err(_) => {
                    tracing::warn!(
                        event_name = "swarm.task.timeout",
                        run_id = %run_id,
                        provider = %provider.name,
                        timeout_ms = limits.per_task_timeout.as_millis() as u64,
                        "provider negotiation abandoned after timeout"
                    );
                    Outcome::timeout(provider)
                }
            };

            tracing::debug!(
                event_name = "swarm.task.resolved",
                run_id = %run_id,
                provider = %outcome.provider.name,
                status = ?outcome.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "provider negotiation resolved"
            );

            // A send failure means the consumer is gone; the outcome is
            // simply discarded.
            let _ = tx.send(outcome).await;
        });
    }

    rx
}

/// Batch form: fan out and collect every outcome, in completion order.
/// An empty provider list resolves immediately to an empty vec.
pub async fn dispatch(
    negotiator: Arc<dyn Negotiator>,
    request: Arc<BookingRequest>,
    providers: Vec<Provider>,
    limits: SwarmLimits,
    run_id: Uuid,
) -> Vec<Outcome> {
    let expected = providers.len();
    let mut rx = spawn_swarm(negotiator, request, providers, limits, run_id);

    let mut outcomes = Vec::with_capacity(expected);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}
