//! REVENUE FLEET — periodic revenue bot orchestration.
//!
//! Entry point. Loads configuration, initialises structured logging, wires
//! the fleet controller, optionally serves the dashboard, and runs until
//! Ctrl+C. Shutdown stops the fleet and lets an in-flight cycle settle.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use revenue_fleet::config;
use revenue_fleet::credentials::ApiKeys;
use revenue_fleet::dashboard::{self, routes::DashboardState};
use revenue_fleet::engine::controller::FleetController;
use revenue_fleet::engine::executor::{BotExecutor, SimulatedExecutor};
use revenue_fleet::entropy::{Entropy, SeededEntropy};

const BANNER: &str = r#"
 ___  _____   _____ _  _ _   _ ___
| _ \| __\ \ / / __| \| | | | | __|
|   /| _| \ V /| _|| .` | |_| | _|
|_|_\|___| \_/ |___|_|\_|\___/|___|
        F  L  E  E  T

  Revenue bot fleet controller
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        fleet_name = %cfg.fleet.name,
        cycle_interval_secs = cfg.fleet.cycle_interval_secs,
        bots = cfg.bots.len(),
        "Fleet starting up"
    );

    // -- Initialise components -------------------------------------------

    let entropy: Arc<dyn Entropy> = Arc::new(SeededEntropy::from_config(cfg.execution.seed));
    if let Some(seed) = cfg.execution.seed {
        info!(seed, "Using fixed RNG seed");
    }

    let executor: Arc<dyn BotExecutor> =
        Arc::new(SimulatedExecutor::new(&cfg.execution, Arc::clone(&entropy)));
    info!(executor = executor.name(), "Executor ready");

    let keys = ApiKeys::from_env(&cfg.credentials);
    let credential_status = keys.status();
    info!(
        payment = credential_status.payment,
        storefront = credential_status.storefront,
        marketplace = credential_status.marketplace,
        target_site = credential_status.target_site,
        "Credentials resolved"
    );
    if !credential_status.payment {
        warn!(
            env = %cfg.credentials.payment_key_env,
            "Payment credential not set; start commands will be rejected"
        );
    }

    let fleet = FleetController::from_config(&cfg, executor, entropy, Arc::new(keys))?;

    // -- Dashboard -------------------------------------------------------

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(
            fleet.clone(),
            credential_status,
            cfg.display.clone(),
        ));
        dashboard::spawn_dashboard(state, cfg.dashboard.port).await?;
    }

    if cfg.fleet.autostart {
        if let Err(e) = fleet.start().await {
            warn!(error = %e, "Autostart failed; waiting for a start command");
        }
    }

    info!("Fleet ready. Press Ctrl+C to stop.");

    // -- Wait for shutdown -----------------------------------------------

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received.");

    fleet.stop().await;

    let revenue = fleet.revenue().await;
    let compliance = fleet.compliance().await;
    info!(
        cycles = fleet.cycle_count().await,
        total = format!("{:.2}", revenue.total_accumulated),
        wallets = revenue.wallet_metrics.len(),
        compliance_score = compliance.current_score,
        violations = compliance.total_violations,
        "Fleet shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("revenue_fleet=info"));

    let json_logging = std::env::var("FLEET_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
