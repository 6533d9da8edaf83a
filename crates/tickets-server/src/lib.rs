//! Scheduler and local control surface for the `tickets` daemon.
//!
//! The control routes mirror what a tray menu would offer: show status,
//! process now, change the interval, exit.

pub mod error;
pub mod routes;
pub mod service;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;

pub use service::{CycleFn, ServiceHandle, StatusSnapshot};

/// Build the axum Router with all control routes.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(root: PathBuf, service: ServiceHandle) -> Router {
    let app_state = state::AppState::new(root, service);

    Router::new()
        .route("/api/status", get(routes::status::get_status))
        .route("/api/pending", get(routes::status::get_pending))
        .route("/api/process", post(routes::control::process_now))
        .route("/api/interval", put(routes::control::set_interval))
        .route("/api/shutdown", post(routes::control::shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve the control routes on a pre-bound listener until the service is
/// shut down.
pub async fn serve_on(
    root: PathBuf,
    service: ServiceHandle,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root, service.clone());

    tracing::info!("tickets control server listening on http://127.0.0.1:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { service.wait_shutdown().await })
        .await?;
    Ok(())
}
