use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::poller::{FixturePoller, PollHealth};
use crate::views::{self, CalendarEvent};

#[derive(Clone)]
pub struct AppState {
    pub poller: FixturePoller,
}

/// Build the read-only views router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/next-match", get(next_match_handler))
        .route("/api/live-score", get(live_score_handler))
        .route("/api/event", get(event_handler))
        .route("/api/calendar", get(calendar_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    health: PollHealth,
    interval_secs: u64,
    fixture_count: usize,
    last_success: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Sensor-style payload: display text plus the view's attributes.
#[derive(Debug, Serialize)]
struct SensorResponse<T: Serialize> {
    state: String,
    #[serde(flatten)]
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.poller.snapshot();
    Json(StatusResponse {
        health: snap.health,
        interval_secs: snap.interval.as_secs(),
        fixture_count: snap.fixtures.len(),
        last_success: snap.last_success,
        last_attempt: snap.last_attempt,
        last_error: snap.last_error.clone(),
    })
}

/// GET /api/next-match
async fn next_match_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.poller.snapshot();
    let next = views::next_match(&snap.fixtures, Utc::now());
    Json(SensorResponse {
        state: next.state().to_string(),
        attributes: next,
    })
}

/// GET /api/live-score
async fn live_score_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.poller.snapshot();
    let live = views::live_score(&snap.fixtures);
    Json(SensorResponse {
        state: live.state(),
        attributes: live,
    })
}

/// GET /api/event
async fn event_handler(State(state): State<Arc<AppState>>) -> Json<Option<CalendarEvent>> {
    let snap = state.poller.snapshot();
    Json(views::current_event(&snap.fixtures, Utc::now()))
}

/// GET /api/calendar?start=2025-03-01T00:00:00Z&end=2025-04-01T00:00:00Z
async fn calendar_handler(
    State(state): State<Arc<AppState>>,
    Query(range): Query<CalendarQuery>,
) -> Json<Vec<CalendarEvent>> {
    let snap = state.poller.snapshot();
    Json(views::calendar_window(&snap.fixtures, range.start, range.end))
}

/// POST /api/refresh
async fn refresh_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.poller.request_refresh();
    StatusCode::ACCEPTED
}
