use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::service::StatusSnapshot;
use crate::state::AppState;

/// GET /api/status: scheduler state, last run and last report.
pub async fn get_status(State(app): State<AppState>) -> Json<StatusSnapshot> {
    Json(app.service.status())
}

/// GET /api/pending: lines waiting in the task file and its conflict copies.
pub async fn get_pending(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = tickets_core::config::Config::load(&root)?;
        let task_file = config.task_file_path(&root);
        let pending = tickets_core::processor::preview(&task_file)?;
        Ok::<_, tickets_core::TicketsError>(serde_json::json!({
            "task_file": task_file,
            "pending": pending,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
