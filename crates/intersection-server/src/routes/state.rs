use axum::extract::State;
use axum::Json;
use chrono::Utc;
use intersection_core::controller::Snapshot;

use crate::state::AppState;

/// GET /api/state: scheduler, signals, evidence and service status.
pub async fn get_state(State(app): State<AppState>) -> Json<Snapshot> {
    Json(app.controller().snapshot(Utc::now()))
}
