//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::DisplayConfig;
use crate::credentials::CredentialStatus;
use crate::dashboard::display::RevenueDisplay;
use crate::engine::controller::FleetController;
use crate::types::{
    Bot, ComplianceState, FleetError, FleetStatus, LogEntry, RevenueEvent, RevenueState, Violation,
};
use crate::wallets::WalletBook;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub fleet: FleetController,
    pub credentials: CredentialStatus,
    pub display: DisplayConfig,
}

impl DashboardState {
    pub fn new(
        fleet: FleetController,
        credentials: CredentialStatus,
        display: DisplayConfig,
    ) -> Self {
        Self {
            fleet,
            credentials,
            display,
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: FleetStatus,
    pub cycle_count: u64,
    pub interval_secs: u64,
    pub bots: usize,
    pub total_accumulated: Decimal,
    pub compliance_score: u32,
    pub outstanding_violations: usize,
    pub total_audits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub status: FleetStatus,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletUpdate {
    pub address: String,
}

type CommandResult = Result<Json<CommandResponse>, (StatusCode, Json<CommandResponse>)>;

const DEFAULT_LOG_LIMIT: usize = 100;
const DEFAULT_RECORD_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let fleet = &state.fleet;
    let revenue = fleet.revenue().await;
    let compliance = fleet.compliance().await;

    Json(StatusResponse {
        status: fleet.status().await,
        cycle_count: fleet.cycle_count().await,
        interval_secs: fleet.interval().as_secs(),
        bots: fleet.bots().await.len(),
        total_accumulated: revenue.total_accumulated,
        compliance_score: compliance.current_score,
        outstanding_violations: compliance.outstanding.len(),
        total_audits: compliance.total_audits,
    })
}

/// GET /api/bots
pub async fn get_bots(State(state): State<AppState>) -> Json<Vec<Bot>> {
    Json(state.fleet.bots().await)
}

/// GET /api/revenue
pub async fn get_revenue(State(state): State<AppState>) -> Json<RevenueState> {
    Json(state.fleet.revenue().await)
}

/// GET /api/revenue/display
pub async fn get_revenue_display(State(state): State<AppState>) -> Json<RevenueDisplay> {
    let revenue = state.fleet.revenue().await;
    Json(RevenueDisplay::from_state(&revenue, &state.display))
}

/// GET /api/revenue/records?limit=N
pub async fn get_revenue_records(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<RevenueEvent>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    Json(state.fleet.revenue_records(limit).await)
}

/// GET /api/compliance
pub async fn get_compliance(State(state): State<AppState>) -> Json<ComplianceState> {
    Json(state.fleet.compliance().await)
}

/// GET /api/violations
pub async fn get_violations(State(state): State<AppState>) -> Json<Vec<Violation>> {
    Json(state.fleet.violations().await)
}

/// GET /api/logs?limit=N
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LogEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Json(state.fleet.logs(limit).await)
}

/// GET /api/wallets
pub async fn get_wallets(State(state): State<AppState>) -> Json<WalletBook> {
    Json(state.fleet.wallets().await)
}

/// GET /api/credentials
pub async fn get_credentials(State(state): State<AppState>) -> Json<CredentialStatus> {
    Json(state.credentials.clone())
}

/// POST /api/fleet/start
pub async fn post_start(State(state): State<AppState>) -> CommandResult {
    match state.fleet.start().await {
        Ok(()) => Ok(Json(CommandResponse {
            status: state.fleet.status().await,
            message: "Bots starting".into(),
        })),
        Err(e) => {
            let code = match e {
                FleetError::MissingCredential(_) => StatusCode::PRECONDITION_FAILED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                code,
                Json(CommandResponse {
                    status: state.fleet.status().await,
                    message: e.to_string(),
                }),
            ))
        }
    }
}

/// POST /api/fleet/stop
pub async fn post_stop(State(state): State<AppState>) -> Json<CommandResponse> {
    let stopped = state.fleet.stop().await;
    Json(CommandResponse {
        status: state.fleet.status().await,
        message: if stopped {
            "Bots stopped".into()
        } else {
            "Fleet was not running".into()
        },
    })
}

/// POST /api/logs/clear
pub async fn post_clear_logs(State(state): State<AppState>) -> Json<CommandResponse> {
    let cleared = state.fleet.clear_logs().await;
    Json(CommandResponse {
        status: state.fleet.status().await,
        message: format!("Cleared {cleared} log entries"),
    })
}

/// POST /api/violations/clear
pub async fn post_clear_violations(State(state): State<AppState>) -> Json<CommandResponse> {
    let cleared = state.fleet.clear_violations().await;
    Json(CommandResponse {
        status: state.fleet.status().await,
        message: format!("Cleared {cleared} violations"),
    })
}

/// POST /api/revenue/reset
pub async fn post_reset_revenue(State(state): State<AppState>) -> Json<CommandResponse> {
    state.fleet.reset_revenue().await;
    Json(CommandResponse {
        status: state.fleet.status().await,
        message: "Revenue totals reset".into(),
    })
}

/// PUT /api/wallets/:purpose
pub async fn put_wallet(
    State(state): State<AppState>,
    Path(purpose): Path<String>,
    Json(update): Json<WalletUpdate>,
) -> CommandResult {
    match state.fleet.set_wallet_address(&purpose, &update.address).await {
        Ok(()) => Ok(Json(CommandResponse {
            status: state.fleet.status().await,
            message: format!("Wallet address for {purpose} updated"),
        })),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(CommandResponse {
                status: state.fleet.status().await,
                message: e.to_string(),
            }),
        )),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
