//! Revenue cycle engine.
//!
//! One cycle = every registered bot runs once. Executions are spawned as
//! independent tasks and joined; that join is the only synchronisation
//! barrier. Successful results are then applied to the ledger in a single
//! sequential pass. A failing bot never aborts the cycle.
//!
//! No deadline is imposed on individual executions.

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::engine::executor::BotExecutor;
use crate::engine::FleetContext;
use crate::types::{Bot, CycleReport, FailedRun, FleetError, RevenueEvent};
use crate::wallets::WalletBook;

// ---------------------------------------------------------------------------
// Execution result
// ---------------------------------------------------------------------------

/// Every result of one fan-out, failures included.
#[derive(Debug, Clone, Default)]
pub struct CycleExecution {
    pub succeeded: Vec<RevenueEvent>,
    pub failed: Vec<FailedRun>,
}

impl CycleExecution {
    pub fn bots_run(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Sum of successful amounts. Saturates; the ledger reports overflow.
    pub fn revenue(&self) -> Decimal {
        self.succeeded
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
    }

    fn fail(&mut self, bot_id: &str, reason: String) {
        self.failed.push(FailedRun {
            bot_id: bot_id.to_string(),
            reason,
            timestamp: Utc::now(),
        });
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct RevenueCycleEngine {
    executor: Arc<dyn BotExecutor>,
    wallets: Arc<RwLock<WalletBook>>,
}

impl RevenueCycleEngine {
    pub fn new(executor: Arc<dyn BotExecutor>, wallets: Arc<RwLock<WalletBook>>) -> Self {
        Self { executor, wallets }
    }

    /// Run every bot concurrently and wait for all of them.
    pub async fn run_cycle(&self, bots: &[Bot]) -> CycleExecution {
        let book = self.wallets.read().await.clone();

        // Inputs are staged in registry order; tasks then share nothing.
        let handles: Vec<_> = bots
            .iter()
            .map(|bot| {
                let destination = book.destination_for(bot);
                let draws = self.executor.prepare(bot);
                let executor = Arc::clone(&self.executor);
                let bot = bot.clone();
                tokio::spawn(async move {
                    match destination {
                        Ok(wallet) => executor.execute(&bot, &wallet, draws).await,
                        Err(e) => Err(e.into()),
                    }
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let mut execution = CycleExecution::default();
        for (bot, result) in bots.iter().zip(joined) {
            match result {
                Ok(Ok(event)) if event.bot_id == bot.id => execution.succeeded.push(event),
                Ok(Ok(event)) => execution.fail(
                    &bot.id,
                    format!("result attributed to {} instead", event.bot_id),
                ),
                Ok(Err(e)) => {
                    let reason = format!("{e:#}");
                    let err = FleetError::Execution {
                        bot_id: bot.id.clone(),
                        reason: reason.clone(),
                    };
                    warn!(error = %err, "Bot execution failed");
                    execution.fail(&bot.id, reason);
                }
                Err(e) => {
                    warn!(bot_id = %bot.id, error = %e, "Bot task did not complete");
                    execution.fail(&bot.id, format!("task aborted: {e}"));
                }
            }
        }

        info!(
            bots = bots.len(),
            succeeded = execution.succeeded.len(),
            failed = execution.failed.len(),
            revenue = %execution.revenue(),
            "Fan-out joined"
        );
        execution
    }

    /// Apply a joined cycle to the context and write its log entries.
    ///
    /// Failed bots are logged and skipped. If the ledger rejects the cycle,
    /// nothing is applied, no revenue record is kept, and the error is
    /// returned.
    pub fn settle(
        ctx: &mut FleetContext,
        cycle_number: u64,
        execution: &CycleExecution,
    ) -> Result<CycleReport, FleetError> {
        for failed in &execution.failed {
            ctx.log.error(format!("Error running bot {}: {}", failed.bot_id, failed.reason));
        }

        let cycle_revenue = match ctx.revenue.apply_results(&execution.succeeded) {
            Ok(total) => total,
            Err(e) => {
                ctx.log.error(format!("Cycle {cycle_number} discarded: {e}"));
                return Err(e);
            }
        };

        ctx.records.extend(execution.succeeded.iter().cloned());

        for event in &execution.succeeded {
            if let Err(e) = ctx.registry.record_revenue(event) {
                warn!(bot_id = %event.bot_id, error = %e, "Revenue for unregistered bot");
            }
            ctx.log.info(format!(
                "Bot {} generated {}{:.2}",
                event.bot_id, event.currency, event.amount
            ));
        }

        ctx.log.info(format!("Cycle completed. Total revenue: {cycle_revenue:.2}"));

        let report = CycleReport {
            cycle_number,
            bots_run: execution.bots_run(),
            succeeded: execution.succeeded.len(),
            failed: execution.failed.len(),
            cycle_revenue,
            total_accumulated: ctx.revenue.total_accumulated,
            timestamp: Utc::now(),
        };
        info!(
            cycle = report.cycle_number,
            succeeded = report.succeeded,
            failed = report.failed,
            revenue = format!("{:.2}", report.cycle_revenue),
            total = format!("{:.2}", report.total_accumulated),
            "Cycle settled"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
