//! Dashboard — Axum web server for monitoring and controlling the fleet.
//!
//! Serves a JSON API over the controller's snapshots and commands.
//! CORS enabled for local development.

pub mod display;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use routes::AppState;

/// Bind the dashboard port and serve in a background task.
///
/// Binding happens before spawning so a taken port is reported to the caller.
pub async fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard server listening on http://localhost:{port}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Snapshots
        .route("/api/status", get(routes::get_status))
        .route("/api/bots", get(routes::get_bots))
        .route("/api/revenue", get(routes::get_revenue))
        .route("/api/revenue/display", get(routes::get_revenue_display))
        .route("/api/revenue/records", get(routes::get_revenue_records))
        .route("/api/compliance", get(routes::get_compliance))
        .route("/api/violations", get(routes::get_violations))
        .route("/api/logs", get(routes::get_logs))
        .route("/api/wallets", get(routes::get_wallets))
        .route("/api/credentials", get(routes::get_credentials))
        // Commands
        .route("/api/fleet/start", post(routes::post_start))
        .route("/api/fleet/stop", post(routes::post_stop))
        .route("/api/logs/clear", post(routes::post_clear_logs))
        .route("/api/violations/clear", post(routes::post_clear_violations))
        .route("/api/revenue/reset", post(routes::post_reset_revenue))
        .route("/api/wallets/:purpose", put(routes::put_wallet))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
