use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;
use crate::service::StatusSnapshot;
use crate::state::AppState;

/// POST /api/process: start a cycle now.
pub async fn process_now(
    State(app): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if !app.service.trigger() {
        return Err(AppError::conflict("a processing cycle is already running"));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "started": true })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct IntervalBody {
    pub seconds: u64,
}

/// PUT /api/interval: change the polling interval.
pub async fn set_interval(
    State(app): State<AppState>,
    Json(body): Json<IntervalBody>,
) -> Result<Json<StatusSnapshot>, AppError> {
    if body.seconds == 0 {
        return Err(AppError::bad_request("interval must be greater than zero"));
    }
    app.service.set_interval(Duration::from_secs(body.seconds));
    Ok(Json(app.service.status()))
}

/// POST /api/shutdown: stop the scheduler and this server.
pub async fn shutdown(State(app): State<AppState>) -> Json<serde_json::Value> {
    app.service.shutdown();
    Json(serde_json::json!({ "stopping": true }))
}
