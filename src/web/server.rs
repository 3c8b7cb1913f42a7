//! Web server setup and routing

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Build the router for the chat UI and its API
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // HTML pages
        .route("/", get(handlers::index))
        // API endpoints
        .route("/api/health", get(handlers::health))
        .route("/api/backend/status", get(handlers::backend_status))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:session_id", delete(handlers::delete_session))
        .route(
            "/api/sessions/:session_id/turns",
            get(handlers::list_turns)
                .post(handlers::submit_turn)
                .delete(handlers::clear_turns),
        )
        .route(
            "/api/sessions/:session_id/export",
            get(handlers::export_session),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// How often idle sessions are looked for
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically discard sessions idle for `session_idle`
pub fn spawn_session_sweeper(state: AppState, session_idle: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL.min(session_idle).max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let evicted = state.evict_idle(session_idle).await;
            if evicted > 0 {
                info!(
                    "Evicted {} idle sessions ({} active)",
                    evicted,
                    state.session_count().await
                );
            }
        }
    })
}

/// Start the web UI server
pub async fn start_server(
    port: u16,
    state: AppState,
    max_upload_bytes: usize,
    session_idle: Duration,
) -> anyhow::Result<()> {
    spawn_session_sweeper(state.clone(), session_idle);
    let app = build_router(state, max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting web UI server on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
