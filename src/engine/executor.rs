//! Per-bot executor.
//!
//! A `BotExecutor` turns one bot plus its destination wallet into a
//! [`RevenueEvent`]. The shipped implementation is a simulation: amounts and
//! currencies come from the injected [`Entropy`]; no payment provider is
//! contacted.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use rust_decimal::prelude::*;
use std::sync::Arc;
use tracing::debug;

use crate::config::ExecutionConfig;
use crate::entropy::{Entropy, RunDraws};
use crate::types::{Bot, RevenueEvent};

/// Abstraction over whatever actually generates revenue for a bot.
///
/// Implementations must not touch shared fleet state from `execute`; each
/// call produces an independent, immutable result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotExecutor: Send + Sync {
    /// Take the random inputs for one run of `bot`.
    ///
    /// Called for every bot in registry order before the cycle fans out.
    fn prepare(&self, bot: &Bot) -> RunDraws;

    /// Run `bot` once, paying into `wallet`, using only `draws`.
    async fn execute(&self, bot: &Bot, wallet: &str, draws: RunDraws) -> Result<RevenueEvent>;

    /// Executor name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Simulated executor
// ---------------------------------------------------------------------------

pub struct SimulatedExecutor {
    entropy: Arc<dyn Entropy>,
    currencies: Vec<String>,
    min_amount: Decimal,
    max_amount: Decimal,
    failure_rate: f64,
}

impl SimulatedExecutor {
    pub fn new(cfg: &ExecutionConfig, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            entropy,
            currencies: cfg.currencies.clone(),
            min_amount: cfg.min_amount,
            max_amount: cfg.max_amount,
            failure_rate: cfg.failure_rate,
        }
    }

    /// Uniform amount in `[min, max]`, rounded to cents.
    ///
    /// Rounding can land exactly on `max`; the result never leaves the range.
    fn draw_amount(&self, draws: &mut RunDraws) -> Result<Decimal> {
        let sample = draws.unit().ok_or_else(|| anyhow!("amount draw missing"))?;
        let unit = Decimal::from_f64(sample)
            .ok_or_else(|| anyhow!("entropy produced a non-finite sample"))?;
        let span = self.max_amount - self.min_amount;
        let amount = (self.min_amount + span * unit).round_dp(2);
        Ok(amount.clamp(self.min_amount, self.max_amount))
    }

    fn draw_currency(&self, draws: &mut RunDraws) -> Result<&str> {
        if self.currencies.is_empty() {
            bail!("no currencies configured");
        }
        let idx = draws.index().ok_or_else(|| anyhow!("currency draw missing"))?;
        Ok(&self.currencies[idx % self.currencies.len()])
    }
}

#[async_trait]
impl BotExecutor for SimulatedExecutor {
    fn prepare(&self, _bot: &Bot) -> RunDraws {
        let mut draws = RunDraws::default();
        if self.failure_rate > 0.0 {
            draws.push_unit(self.entropy.unit());
        }
        draws.push_unit(self.entropy.unit());
        draws.push_index(self.entropy.index(self.currencies.len()));
        draws
    }

    async fn execute(&self, bot: &Bot, wallet: &str, mut draws: RunDraws) -> Result<RevenueEvent> {
        if self.failure_rate > 0.0 {
            let roll = draws.unit().ok_or_else(|| anyhow!("failure draw missing"))?;
            if roll < self.failure_rate {
                bail!("simulated provider error");
            }
        }

        let amount = self.draw_amount(&mut draws)?;
        let currency = self.draw_currency(&mut draws)?;
        if amount <= Decimal::ZERO {
            bail!("non-positive amount drawn: {amount}");
        }

        debug!(
            bot_id = %bot.id,
            amount = %amount,
            currency,
            wallet,
            "[SIMULATED] Revenue generated"
        );

        Ok(RevenueEvent::for_bot(bot, amount, currency, wallet))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
