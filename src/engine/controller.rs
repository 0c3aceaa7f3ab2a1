//! Fleet controller — the stopped / running / paused state machine.
//!
//! The controller is the only component that changes [`FleetStatus`]. While
//! running it owns a timer task that fires one cycle per interval. Cycles are
//! serialised: the timer awaits each cycle before waiting for the next tick,
//! and a cycle gate also covers cycles triggered on demand.
//!
//! Stopping or pausing cancels the timer through a signal; a cycle that is
//! already executing is never aborted and applies its results first.
//!
//! Lock order: cycle gate → control → context.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::compliance::ComplianceMonitor;
use crate::config::AppConfig;
use crate::credentials::CredentialProvider;
use crate::engine::cycle::RevenueCycleEngine;
use crate::engine::executor::BotExecutor;
use crate::engine::FleetContext;
use crate::entropy::Entropy;
use crate::registry::BotRegistry;
use crate::types::{
    Bot, ComplianceCheck, ComplianceState, CycleReport, FleetError, FleetStatus, LogEntry,
    PauseReason, RevenueEvent, RevenueState, Violation,
};
use crate::wallets::WalletBook;

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// What one cycle did.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The timer fired after the fleet left `running`; nothing ran.
    Skipped,
    /// Results applied, audit clean or medium-only.
    Settled {
        report: CycleReport,
        compliance: ComplianceCheck,
    },
    /// The cycle demands a pause (high-severity violation or failure).
    Halted {
        report: Option<CycleReport>,
        compliance: Option<ComplianceCheck>,
        reason: PauseReason,
    },
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Settled { report, .. } => Some(report),
            CycleOutcome::Halted { report, .. } => report.as_ref(),
            CycleOutcome::Skipped => None,
        }
    }

    /// Whether the timer should stop ticking after this cycle.
    pub fn ends_timer(&self) -> bool {
        !matches!(self, CycleOutcome::Settled { .. })
    }
}

// ---------------------------------------------------------------------------
// Control state
// ---------------------------------------------------------------------------

/// Handle to the running timer task. Kept next to, never inside, the status.
struct CycleTimer {
    generation: u64,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct ControlState {
    status: FleetStatus,
    timer: Option<CycleTimer>,
    generation: u64,
}

struct Shared {
    context: RwLock<FleetContext>,
    control: Mutex<ControlState>,
    cycle_gate: Mutex<()>,
    engine: RevenueCycleEngine,
    monitor: ComplianceMonitor,
    wallets: Arc<RwLock<WalletBook>>,
    credentials: Arc<dyn CredentialProvider>,
    interval: Duration,
}

/// Cheaply cloneable handle to the fleet.
#[derive(Clone)]
pub struct FleetController {
    shared: Arc<Shared>,
}

impl FleetController {
    pub fn new(
        context: FleetContext,
        engine: RevenueCycleEngine,
        monitor: ComplianceMonitor,
        wallets: Arc<RwLock<WalletBook>>,
        credentials: Arc<dyn CredentialProvider>,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                context: RwLock::new(context),
                control: Mutex::new(ControlState {
                    status: FleetStatus::Stopped,
                    timer: None,
                    generation: 0,
                }),
                cycle_gate: Mutex::new(()),
                engine,
                monitor,
                wallets,
                credentials,
                interval,
            }),
        }
    }

    /// Wire a controller from configuration.
    ///
    /// The same entropy source feeds the compliance monitor; the executor is
    /// built by the caller so that it can share or replace it.
    pub fn from_config(
        cfg: &AppConfig,
        executor: Arc<dyn BotExecutor>,
        entropy: Arc<dyn Entropy>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, FleetError> {
        let registry = BotRegistry::new(cfg.bots.clone())?;
        let wallets = Arc::new(RwLock::new(WalletBook::from_config(&cfg.wallets)));
        let context = FleetContext::new(registry, ComplianceState::new());
        let engine = RevenueCycleEngine::new(executor, Arc::clone(&wallets));
        let monitor = ComplianceMonitor::new(&cfg.compliance, entropy);
        Ok(Self::new(
            context,
            engine,
            monitor,
            wallets,
            credentials,
            cfg.fleet.cycle_interval(),
        ))
    }

    // -- Commands ----------------------------------------------------------

    /// `stopped | paused → running`.
    ///
    /// Rejected without any state change when the execution credential is
    /// missing. Starting an already running fleet is a no-op.
    pub async fn start(&self) -> Result<(), FleetError> {
        let mut control = self.shared.control.lock().await;
        if control.status == FleetStatus::Running {
            warn!("Start requested but fleet is already running");
            return Ok(());
        }

        if !self.shared.credentials.has_execution_credential() {
            let name = self.shared.credentials.execution_credential_name().to_string();
            warn!(
                credential = %name,
                status = %control.status,
                "Start rejected: credential missing"
            );
            self.shared
                .context
                .write()
                .await
                .log
                .error(format!("Please set {name} before starting bots"));
            return Err(FleetError::MissingCredential(name));
        }

        let previous = control.status;
        control.generation += 1;
        let generation = control.generation;
        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&self.shared).drive(generation, cancelled));
        control.status = FleetStatus::Running;
        control.timer = Some(CycleTimer {
            generation,
            cancel,
            handle,
        });

        self.shared.context.write().await.log.info("Bots starting...");
        info!(
            from = %previous,
            generation,
            interval_secs = self.shared.interval.as_secs_f64(),
            "Fleet running"
        );
        Ok(())
    }

    /// `running → stopped`.
    ///
    /// Cancels the timer and waits for an in-flight cycle to finish applying
    /// its results. Returns `false` if the fleet was not running.
    pub async fn stop(&self) -> bool {
        let timer = {
            let mut control = self.shared.control.lock().await;
            if control.status != FleetStatus::Running {
                debug!(status = %control.status, "Stop ignored: fleet not running");
                return false;
            }
            control.status = FleetStatus::Stopped;
            control.timer.take()
        };

        self.shared.context.write().await.log.info("Bots stopped by user");
        info!("Fleet stopped");

        if let Some(timer) = timer {
            let _ = timer.cancel.send(true);
            if let Err(e) = timer.handle.await {
                warn!(error = %e, "Cycle timer ended abnormally");
            }
        }
        true
    }

    /// Run one cycle now, serialised with the timer.
    ///
    /// Pause transitions apply only while the fleet is running.
    pub async fn run_cycle_once(&self) -> CycleOutcome {
        self.shared.run_cycle(None).await
    }

    /// Clear the activity log. Returns how many entries were dropped.
    pub async fn clear_logs(&self) -> usize {
        let mut ctx = self.shared.context.write().await;
        let cleared = ctx.log.len();
        ctx.log.clear();
        cleared
    }

    /// Clear outstanding violations and reset `recent_violations`.
    pub async fn clear_violations(&self) -> usize {
        let mut ctx = self.shared.context.write().await;
        let cleared = ctx.compliance.clear_violations();
        ctx.log.info(format!("Cleared {cleared} violations"));
        cleared
    }

    /// Zero the revenue totals and per-bot/per-wallet metrics.
    ///
    /// Revenue records are history and stay.
    pub async fn reset_revenue(&self) {
        let mut ctx = self.shared.context.write().await;
        ctx.revenue.clear();
        ctx.log.info("Revenue totals reset");
        info!("Revenue totals reset");
    }

    /// Point a wallet purpose at a new address.
    pub async fn set_wallet_address(&self, purpose: &str, address: &str) -> Result<(), FleetError> {
        self.shared.wallets.write().await.update(purpose, address)?;
        self.shared
            .context
            .write()
            .await
            .log
            .info(format!("Wallet address for {purpose} updated"));
        Ok(())
    }

    // -- Snapshots ---------------------------------------------------------

    pub async fn status(&self) -> FleetStatus {
        self.shared.control.lock().await.status
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    pub async fn cycle_count(&self) -> u64 {
        self.shared.context.read().await.cycle_count
    }

    pub async fn bots(&self) -> Vec<Bot> {
        self.shared.context.read().await.registry.snapshot()
    }

    pub async fn revenue(&self) -> RevenueState {
        self.shared.context.read().await.revenue.clone()
    }

    pub async fn compliance(&self) -> ComplianceState {
        self.shared.context.read().await.compliance.clone()
    }

    pub async fn violations(&self) -> Vec<Violation> {
        self.shared.context.read().await.compliance.outstanding.clone()
    }

    /// Most recent first.
    pub async fn logs(&self, limit: usize) -> Vec<LogEntry> {
        self.shared.context.read().await.log.recent(limit)
    }

    /// Applied revenue events, most recent first.
    pub async fn revenue_records(&self, limit: usize) -> Vec<RevenueEvent> {
        let ctx = self.shared.context.read().await;
        ctx.records.iter().rev().take(limit).cloned().collect()
    }

    pub async fn wallets(&self) -> WalletBook {
        self.shared.wallets.read().await.clone()
    }
}

impl Shared {
    /// Timer loop for one `running` period.
    async fn drive(self: Arc<Self>, generation: u64, mut cancelled: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.run_cycle(Some(generation)).await.ends_timer() {
                        break;
                    }
                }
                _ = cancelled.changed() => break,
            }
        }
        debug!(generation, "Cycle timer exited");
    }

    async fn is_current(&self, generation: u64) -> bool {
        let control = self.control.lock().await;
        control.status == FleetStatus::Running
            && control.timer.as_ref().map(|t| t.generation) == Some(generation)
    }

    /// Execute → aggregate → audit, then pause if the cycle demands it.
    async fn run_cycle(&self, generation: Option<u64>) -> CycleOutcome {
        let _gate = self.cycle_gate.lock().await;

        if let Some(g) = generation {
            if !self.is_current(g).await {
                debug!(generation = g, "Stale timer tick skipped");
                return CycleOutcome::Skipped;
            }
        }

        let (cycle_number, bots) = {
            let mut ctx = self.context.write().await;
            ctx.cycle_count += 1;
            ctx.log.info("Starting new bot cycle");
            (ctx.cycle_count, ctx.registry.snapshot())
        };
        info!(cycle = cycle_number, bots = bots.len(), "Starting cycle");

        let execution = self.engine.run_cycle(&bots).await;

        let outcome = {
            let mut ctx = self.context.write().await;
            match RevenueCycleEngine::settle(&mut ctx, cycle_number, &execution) {
                Ok(report) => {
                    let check = self.monitor.evaluate(&mut ctx.compliance);
                    for v in &check.violations_found {
                        ctx.log.error(format!(
                            "Violation detected ({}/{}): {}",
                            v.violation_type, v.severity, v.description
                        ));
                    }
                    if check.requires_pause() {
                        ctx.log.error("High severity violation detected. Pausing bots.");
                        CycleOutcome::Halted {
                            report: Some(report),
                            compliance: Some(check),
                            reason: PauseReason::ComplianceViolation,
                        }
                    } else {
                        CycleOutcome::Settled {
                            report,
                            compliance: check,
                        }
                    }
                }
                Err(e) => {
                    ctx.log.error(format!("Error in bot cycle: {e}"));
                    CycleOutcome::Halted {
                        report: None,
                        compliance: None,
                        reason: PauseReason::CycleFailure(e.to_string()),
                    }
                }
            }
        };

        if let CycleOutcome::Halted { reason, .. } = &outcome {
            self.pause(reason, generation).await;
        }
        outcome
    }

    /// `running → paused`. The timer is signalled, not awaited: the caller
    /// may be the timer task itself.
    async fn pause(&self, reason: &PauseReason, generation: Option<u64>) -> bool {
        let mut control = self.control.lock().await;
        if control.status != FleetStatus::Running {
            debug!(status = %control.status, %reason, "Pause skipped: fleet not running");
            return false;
        }
        if let Some(g) = generation {
            if control.timer.as_ref().map(|t| t.generation) != Some(g) {
                return false;
            }
        }

        control.status = FleetStatus::Paused;
        if let Some(timer) = control.timer.take() {
            let _ = timer.cancel.send(true);
        }

        self.context
            .write()
            .await
            .log
            .error(format!("Bots paused due to {reason}"));
        warn!(%reason, "Fleet paused");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
