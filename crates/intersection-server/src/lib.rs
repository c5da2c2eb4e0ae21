pub mod error;
pub mod routes;
pub mod state;
pub mod ticker;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use intersection_core::config::Config;
use intersection_core::density::DensityProvider;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Largest accepted lane image, matching the density service's own limit.
const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // State
        .route("/api/state", get(routes::state::get_state))
        // Evidence
        .route(
            "/api/lanes/{lane}/evidence",
            put(routes::lanes::put_evidence).delete(routes::lanes::delete_evidence),
        )
        // Run control
        .route("/api/run", post(routes::run::start_run))
        .route("/api/reset", post(routes::run::reset))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the HTTP shell on a pre-bound listener.
///
/// Accepting a bound `TcpListener` lets the caller read the actual port
/// before starting (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(
    config: &Config,
    provider: Arc<dyn DensityProvider>,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(state::AppState::new(provider, &config.timing));

    tracing::info!("intersection server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
