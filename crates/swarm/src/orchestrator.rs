//! Batch and streaming entry points over the dispatcher + ranking
//! pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use callpilot_core::{
    rank, score_candidate, BookingRequest, DomainError, Outcome, Provider, ScoredCandidate,
};

use crate::dispatcher::{dispatch, spawn_swarm, SwarmLimits};
use crate::events::SwarmEvent;
use crate::negotiator::Negotiator;

/// The structured result of one batch orchestration run. `outcomes` is
/// in completion order (informational only); `ranked` is deterministic
/// given the outcomes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SwarmOutcome {
    pub outcomes: Vec<Outcome>,
    pub ranked: Vec<ScoredCandidate>,
    pub best: Option<ScoredCandidate>,
}

/// Run the full dispatch + rank pipeline and return the aggregate
/// result.
///
/// The only failure is request validation before dispatch begins. Zero
/// successful providers is a valid, non-error result with an empty
/// ranking.
pub async fn orchestrate(
    negotiator: Arc<dyn Negotiator>,
    request: &BookingRequest,
    providers: Vec<Provider>,
    limits: SwarmLimits,
) -> Result<SwarmOutcome, DomainError> {
    request.validate()?;

    let run_id = Uuid::new_v4();
    tracing::info!(
        event_name = "swarm.run.start",
        run_id = %run_id,
        service = %request.service,
        provider_count = providers.len(),
        max_concurrency = limits.max_concurrency,
        "dispatching negotiation swarm"
    );

    let shared = Arc::new(request.clone());
    let outcomes = dispatch(negotiator, shared, providers, limits, run_id).await;
    let ranking = rank(&outcomes, request);

    tracing::info!(
        event_name = "swarm.run.complete",
        run_id = %run_id,
        outcome_count = outcomes.len(),
        ranked_count = ranking.ranked.len(),
        best = ranking.best.as_ref().map(|c| c.provider.name.as_str()).unwrap_or("none"),
        "negotiation swarm complete"
    );

    Ok(SwarmOutcome { outcomes, ranked: ranking.ranked, best: ranking.best })
}

/// Streaming form of [`orchestrate`]: the producer runs on its own task
/// and pushes events through a capacity-one channel, so the consumer
/// sees them one at a time in production order.
///
/// If the consumer disconnects early the producer keeps draining
/// negotiation outcomes (sends to the closed channel fail fast), so
/// in-flight tasks complete and release their admission slots without
/// deadlocking anyone.
pub fn orchestrate_stream(
    negotiator: Arc<dyn Negotiator>,
    request: BookingRequest,
    providers: Vec<Provider>,
    limits: SwarmLimits,
) -> Result<mpsc::Receiver<SwarmEvent>, DomainError> {
    request.validate()?;

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let run_id = Uuid::new_v4();

        let start = SwarmEvent::Start {
            provider_count: providers.len(),
            providers: providers.clone(),
        };
        if tx.send(start).await.is_err() {
            // Consumer went away before anything started; nothing to drain.
            return;
        }

        let request = Arc::new(request);
        let mut outcome_rx =
            spawn_swarm(negotiator, Arc::clone(&request), providers, limits, run_id);

        let mut outcomes = Vec::new();
        let mut consumer_gone = false;
        while let Some(outcome) = outcome_rx.recv().await {
            if !consumer_gone {
                let score =
                    outcome.is_bookable().then(|| score_candidate(&outcome, &request));
                let event = SwarmEvent::Progress { outcome: outcome.clone(), score };
                if tx.send(event).await.is_err() {
                    tracing::debug!(
                        event_name = "swarm.stream.consumer_gone",
                        run_id = %run_id,
                        "stream consumer disconnected; draining remaining outcomes"
                    );
                    consumer_gone = true;
                }
            }
            outcomes.push(outcome);
        }

        if consumer_gone {
            return;
        }

        let ranking = rank(&outcomes, &request);
        let complete =
            SwarmEvent::Complete { ranked: ranking.ranked, best: ranking.best, error: None };
        let _ = tx.send(complete).await;
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use callpilot_core::{
        BookingRequest, Outcome, OutcomeStatus, Preferences, Provider, TimeWindow,
    };

    use super::{orchestrate, orchestrate_stream, SwarmLimits};
    use crate::events::SwarmEvent;
    use crate::negotiator::{NegotiationError, Negotiator};

    /// Negotiates the provider's first availability slot after a short
    /// sleep, counting completed calls.
    struct FirstSlotNegotiator {
        completed: AtomicUsize,
    }

    impl FirstSlotNegotiator {
        fn new() -> Arc<Self> {
            Arc::new(Self { completed: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl Negotiator for FirstSlotNegotiator {
        async fn negotiate(
            &self,
            provider: &Provider,
            _request: &BookingRequest,
        ) -> Result<Outcome, NegotiationError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let outcome = match provider.availability.first() {
                Some(slot) => Outcome::ok(provider.clone(), slot.clone(), Vec::new()),
                None => Outcome::no_availability(provider.clone(), Vec::new()),
            };
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(outcome)
        }
    }

    fn provider(name: &str, slot: &str, rating: f64, distance_miles: f64) -> Provider {
        Provider {
            name: name.to_string(),
            service: "dentist".to_string(),
            availability: vec![slot.to_string()],
            rating,
            distance_miles,
            simulated_latency_s: None,
        }
    }

    fn dentist_request() -> BookingRequest {
        BookingRequest {
            service: "dentist".to_string(),
            time_window: Some(TimeWindow {
                date: Some("2026-02-08".to_string()),
                start: Some("09:00".to_string()),
                end: Some("17:00".to_string()),
            }),
            preferences: None,
        }
    }

    #[tokio::test]
    async fn batch_run_ranks_the_earlier_slot_first_under_default_weights() {
        let result = orchestrate(
            FirstSlotNegotiator::new(),
            &dentist_request(),
            vec![
                provider("A", "09:00", 4.5, 2.0),
                provider("B", "16:00", 4.8, 8.0),
            ],
            SwarmLimits::default(),
        )
        .await
        .expect("valid request");

        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.ranked.len(), 2);
        assert_eq!(result.best.as_ref().map(|c| c.provider.name.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn empty_provider_list_is_a_valid_empty_result() {
        let result = orchestrate(
            FirstSlotNegotiator::new(),
            &dentist_request(),
            Vec::new(),
            SwarmLimits::default(),
        )
        .await
        .expect("valid request");

        assert!(result.outcomes.is_empty());
        assert!(result.ranked.is_empty());
        assert_eq!(result.best, None);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_dispatch() {
        let negotiator = FirstSlotNegotiator::new();
        let request = BookingRequest { service: "  ".to_string(), ..Default::default() };

        let result = orchestrate(
            Arc::clone(&negotiator) as Arc<dyn Negotiator>,
            &request,
            vec![provider("A", "09:00", 4.5, 2.0)],
            SwarmLimits::default(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(negotiator.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_weights_are_rejected_before_dispatch() {
        let mut request = dentist_request();
        request.preferences =
            Some(Preferences { time_weight: -0.5, ..Preferences::default() });

        let result = orchestrate(
            FirstSlotNegotiator::new(),
            &request,
            vec![provider("A", "09:00", 4.5, 2.0)],
            SwarmLimits::default(),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stream_emits_start_then_one_progress_per_provider_then_complete() {
        let mut rx = orchestrate_stream(
            FirstSlotNegotiator::new(),
            dentist_request(),
            vec![
                provider("A", "09:00", 4.5, 2.0),
                provider("B", "16:00", 4.8, 8.0),
                provider("C", "10:00", 3.9, 1.0),
            ],
            SwarmLimits::default(),
        )
        .expect("valid request");

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 5, "start + 3 progress + complete");
        assert!(matches!(
            events.first(),
            Some(SwarmEvent::Start { provider_count: 3, .. })
        ));
        let progress_count = events
            .iter()
            .filter(|event| matches!(event, SwarmEvent::Progress { .. }))
            .count();
        assert_eq!(progress_count, 3);

        match events.last() {
            Some(SwarmEvent::Complete { ranked, best, error }) => {
                assert_eq!(ranked.len(), 3);
                assert_eq!(best.as_ref().map(|c| c.provider.name.as_str()), Some("A"));
                assert_eq!(*error, None);
            }
            other => panic!("expected terminal complete event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_progress_events_carry_an_eager_score() {
        let mut rx = orchestrate_stream(
            FirstSlotNegotiator::new(),
            dentist_request(),
            vec![provider("A", "09:00", 4.5, 2.0)],
            SwarmLimits::default(),
        )
        .expect("valid request");

        while let Some(event) = rx.recv().await {
            if let SwarmEvent::Progress { outcome, score } = event {
                assert_eq!(outcome.status, OutcomeStatus::Ok);
                let score = score.expect("ok progress must carry a score");
                assert!(score.score > 0.0);
                assert_eq!(score.components.time, 1.0);
            }
        }
    }

    #[tokio::test]
    async fn early_consumer_disconnect_still_drains_all_negotiations() {
        let negotiator = FirstSlotNegotiator::new();

        let mut rx = orchestrate_stream(
            Arc::clone(&negotiator) as Arc<dyn Negotiator>,
            dentist_request(),
            vec![
                provider("A", "09:00", 4.5, 2.0),
                provider("B", "16:00", 4.8, 8.0),
                provider("C", "10:00", 3.9, 1.0),
            ],
            SwarmLimits { max_concurrency: 1, per_task_timeout: Duration::from_secs(5) },
        )
        .expect("valid request");

        // Read only the start event, then walk away.
        let first = rx.recv().await.expect("start event");
        assert!(matches!(first, SwarmEvent::Start { .. }));
        drop(rx);

        // The producer must keep draining; every negotiation still runs
        // to completion.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if negotiator.completed.load(Ordering::SeqCst) == 3 {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "negotiations did not finish after the consumer disconnected"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn stream_for_invalid_request_fails_before_any_event() {
        let request = BookingRequest { service: String::new(), ..Default::default() };
        let result = orchestrate_stream(
            FirstSlotNegotiator::new(),
            request,
            vec![provider("A", "09:00", 4.5, 2.0)],
            SwarmLimits::default(),
        );
        assert!(result.is_err());
    }
}
