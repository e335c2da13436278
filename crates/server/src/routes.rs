//! The swarm orchestration and calendar routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::info;

use callpilot_core::calendar::{Calendar, CalendarFile};
use callpilot_core::slots::parse_slot;
use callpilot_core::{BookingRequest, TimeWindow};
use callpilot_swarm::{orchestrate, orchestrate_stream, SwarmEvent, SwarmLimits};

use crate::bootstrap::AppState;

const DEFAULT_BATCH_LIMIT: usize = 15;
const DEFAULT_STREAM_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SwarmBody {
    #[serde(flatten)]
    pub request: BookingRequest,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message.into() })).into_response()
}

pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "CallPilot Swarm Orchestrator",
        "endpoints": ["/health", "/swarm", "/swarm/stream", "/calendar", "/check-calendar"],
    }))
}

/// Batch orchestration: dispatch the swarm and reply once with the full
/// outcome set and ranking.
pub async fn swarm(State(state): State<AppState>, Json(body): Json<SwarmBody>) -> Response {
    let limit = body.limit.unwrap_or(DEFAULT_BATCH_LIMIT);
    let providers = state.store.filtered(Some(&body.request.service), limit);
    if providers.is_empty() {
        return bad_request("no providers available");
    }

    info!(
        event_name = "server.swarm.request",
        service = %body.request.service,
        provider_count = providers.len(),
        "batch swarm requested"
    );

    let limits = SwarmLimits::from(&state.config.swarm);
    match orchestrate(Arc::clone(&state.negotiator), &body.request, providers, limits).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => bad_request(error.to_string()),
    }
}

/// Streaming orchestration: one NDJSON line per event, terminated by a
/// single `complete` line.
pub async fn swarm_stream(State(state): State<AppState>, Json(body): Json<SwarmBody>) -> Response {
    let limit = body.limit.unwrap_or(DEFAULT_STREAM_LIMIT);
    let providers = state.store.filtered(Some(&body.request.service), limit);
    if providers.is_empty() {
        return bad_request("no providers available");
    }

    info!(
        event_name = "server.swarm.stream_request",
        service = %body.request.service,
        provider_count = providers.len(),
        "streaming swarm requested"
    );

    let limits = SwarmLimits::from(&state.config.swarm);
    match orchestrate_stream(Arc::clone(&state.negotiator), body.request, providers, limits) {
        Ok(rx) => {
            let lines = ReceiverStream::new(rx)
                .map(|event| Ok::<_, std::convert::Infallible>(ndjson_line(&event)));
            ndjson_response(Body::from_stream(lines))
        }
        // The pipeline could not be constructed; the stream still
        // terminates with exactly one `complete` event.
        Err(error) => {
            let complete = SwarmEvent::Complete {
                ranked: Vec::new(),
                best: None,
                error: Some(error.to_string()),
            };
            ndjson_response(Body::from(ndjson_line(&complete)))
        }
    }
}

fn ndjson_line(event: &SwarmEvent) -> String {
    let mut line = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    line.push('\n');
    line
}

fn ndjson_response(body: Body) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

/// Serve the raw user calendar. Always valid JSON; a broken file reads
/// as an empty calendar.
pub async fn get_calendar(State(state): State<AppState>) -> Json<CalendarFile> {
    Json(CalendarFile::load(&state.config.data.calendar_path))
}

#[derive(Debug, Deserialize)]
pub struct CheckCalendarBody {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AvailableSlot {
    pub date: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct CheckCalendarResponse {
    pub available_slots: Vec<AvailableSlot>,
}

/// Enumerate free hourly slots on the user's own calendar for a date
/// and window (defaults 09:00-17:00).
pub async fn check_calendar(
    State(state): State<AppState>,
    Json(body): Json<CheckCalendarBody>,
) -> Response {
    let Some(date) = body.date.as_deref().filter(|d| !d.trim().is_empty()) else {
        return bad_request("date is required");
    };

    let (start, end) = match body.time_window {
        Some(window) => (window.start, window.end),
        None => (body.start, body.end),
    };
    let start = start.as_deref().unwrap_or("09:00");
    let end = end.as_deref().unwrap_or("17:00");

    let window_start = parse_slot(start, Some(date));
    let window_end = parse_slot(end, Some(date));
    let (Some(window_start), Some(window_end)) = (window_start, window_end) else {
        return bad_request("invalid time window");
    };
    if window_start >= window_end {
        return bad_request("invalid time window");
    }

    let calendar = Calendar::load(&state.config.data.calendar_path);
    let available_slots = calendar
        .free_hourly_slots(window_start, window_end)
        .into_iter()
        .map(|(slot_start, slot_end)| AvailableSlot {
            date: date.to_string(),
            start: slot_start.format("%H:%M").to_string(),
            end: slot_end.format("%H:%M").to_string(),
        })
        .collect();

    (StatusCode::OK, Json(CheckCalendarResponse { available_slots })).into_response()
}
