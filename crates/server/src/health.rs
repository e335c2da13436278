use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use callpilot_core::calendar::CalendarFile;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub providers: HealthCheck,
    pub calendar: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let providers = providers_check(&state);
    let calendar = calendar_check(&state);
    let ready = providers.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "callpilot-server runtime initialized".to_string(),
        },
        providers,
        calendar,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn providers_check(state: &AppState) -> HealthCheck {
    let providers = state.store.load();
    if providers.is_empty() {
        HealthCheck {
            status: "degraded",
            detail: format!(
                "no providers loaded from {}",
                state.config.data.providers_path.display()
            ),
        }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!("{} providers loaded", providers.len()),
        }
    }
}

fn calendar_check(state: &AppState) -> HealthCheck {
    // A missing calendar is a valid empty calendar, so this check never
    // degrades the overall status.
    let calendar = CalendarFile::load(&state.config.data.calendar_path);
    HealthCheck {
        status: "ready",
        detail: format!("{} busy slots loaded", calendar.user_calendar.busy_slots.len()),
    }
}
