//! Health check handler

use axum::{extract::State, Json};
use redbutton_service::HealthResponse;

use crate::state::AppState;

/// Basic health check (liveness probe)
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let environment = format!("{:?}", state.config().app.env).to_lowercase();
    Json(HealthResponse::healthy(&environment))
}
