//! In-process negotiation against the provider's published availability.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use callpilot_core::calendar::Calendar;
use callpilot_core::slots::{parse_slot, window_bounds};
use callpilot_core::{BookingRequest, Outcome, Provider};
use callpilot_swarm::{NegotiationError, Negotiator};

const DEFAULT_LATENCY: Duration = Duration::from_millis(1_500);

/// Simulated negotiation transport: sleeps the provider's artificial
/// latency, then books the earliest availability slot that parses, is
/// free on the user's calendar, and falls inside the requested window.
///
/// The busy check compares only the slot start against each busy
/// interval, matching the calendar's documented semantics.
pub struct SimulatedNegotiator {
    calendar: Calendar,
    default_latency: Duration,
}

impl SimulatedNegotiator {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar, default_latency: DEFAULT_LATENCY }
    }

    /// Override the latency used when a provider does not declare one.
    /// Tests use this to keep runs fast.
    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    fn pick_slot(&self, provider: &Provider, request: &BookingRequest) -> Option<String> {
        let hint = request.date_hint();

        let mut parsed: Vec<(&str, NaiveDateTime)> = provider
            .availability
            .iter()
            .filter_map(|slot| parse_slot(slot, hint).map(|at| (slot.as_str(), at)))
            .filter(|(_, at)| !self.calendar.is_busy(*at))
            .collect();
        if parsed.is_empty() {
            return None;
        }
        parsed.sort_by_key(|(_, at)| *at);

        let Some(window) = &request.time_window else {
            return parsed.first().map(|(slot, _)| (*slot).to_string());
        };

        let (start, end) = window_bounds(window);
        parsed
            .into_iter()
            .find(|(_, at)| {
                !start.is_some_and(|bound| *at < bound) && !end.is_some_and(|bound| *at > bound)
            })
            .map(|(slot, _)| slot.to_string())
    }
}

#[async_trait]
impl Negotiator for SimulatedNegotiator {
    async fn negotiate(
        &self,
        provider: &Provider,
        request: &BookingRequest,
    ) -> Result<Outcome, NegotiationError> {
        let latency = provider
            .simulated_latency_s
            .filter(|secs| *secs >= 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(self.default_latency);
        tokio::time::sleep(latency).await;

        let greeting = format!("{}: Thank you for calling. How can we help?", provider.name);
        let ask = request_line(request);

        match self.pick_slot(provider, request) {
            Some(slot) => Ok(Outcome::ok(
                provider.clone(),
                slot.clone(),
                vec![
                    greeting,
                    ask,
                    format!("{}: We can do {slot}.", provider.name),
                    "Agent: Great, please book it under Alex.".to_string(),
                    format!("{}: You're all set for {slot}.", provider.name),
                ],
            )),
            None => Ok(Outcome::no_availability(
                provider.clone(),
                vec![
                    greeting,
                    ask,
                    format!("{}: Sorry, no slots match that request.", provider.name),
                    "Agent: Thanks for checking. Please let us know if anything opens up."
                        .to_string(),
                ],
            )),
        }
    }
}

/// The agent's opening request line, including the a/an article choice
/// for the service noun.
fn request_line(request: &BookingRequest) -> String {
    let service = request.service.trim();
    let service = if service.is_empty() { "appointment" } else { service };

    let article = match service.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };

    let mut line = format!("Agent: I'd like to book {article} {service}");
    if let Some(window) = &request.time_window {
        let described = format!(
            "{} between {} and {}",
            window.date.as_deref().unwrap_or(""),
            window.start.as_deref().unwrap_or(""),
            window.end.as_deref().unwrap_or("")
        );
        let described = described.trim();
        if !described.is_empty() {
            line = format!("{line} for {described}");
        }
    }
    format!("{line}.")
}
