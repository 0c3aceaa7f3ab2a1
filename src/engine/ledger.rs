//! Wallet ledger — revenue aggregation.
//!
//! Applies a cycle's successful results to the per-wallet and per-bot
//! totals and the grand total. No currency conversion happens here: raw
//! per-currency amounts are kept and conversion is a read-side concern.
//!
//! A cycle is applied atomically. All events are staged against a copy of
//! the state and only swapped in if every one of them is valid.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::{BotMetric, FleetError, RevenueEvent, RevenueState, WalletMetric};

fn checked(lhs: Decimal, rhs: Decimal, what: &str) -> Result<Decimal, FleetError> {
    lhs.checked_add(rhs)
        .ok_or_else(|| FleetError::Aggregation(format!("{what} overflowed")))
}

impl RevenueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every event of one cycle, or none of them.
    ///
    /// Returns the revenue added by this cycle.
    pub fn apply_results(&mut self, events: &[RevenueEvent]) -> Result<Decimal, FleetError> {
        if events.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let mut staged = self.clone();
        let mut cycle_total = Decimal::ZERO;

        for event in events {
            if event.amount <= Decimal::ZERO {
                warn!(
                    bot_id = %event.bot_id,
                    amount = %event.amount,
                    "Rejecting non-positive amount"
                );
                return Err(FleetError::Aggregation(format!(
                    "bot {} reported non-positive amount {}",
                    event.bot_id, event.amount
                )));
            }

            let wallet = staged
                .wallet_metrics
                .entry(event.wallet.clone())
                .or_insert_with(|| WalletMetric::new(&event.currency));
            wallet.total = checked(wallet.total, event.amount, "wallet total")?;
            wallet.count += 1;
            let raw = wallet.by_currency.entry(event.currency.clone()).or_default();
            *raw = checked(*raw, event.amount, "wallet currency total")?;

            let bot = staged
                .bot_metrics
                .entry(event.bot_id.clone())
                .or_insert_with(|| BotMetric {
                    total: Decimal::ZERO,
                    currency: event.currency.clone(),
                    count: 0,
                    role: event.role.clone(),
                    region: event.region.clone(),
                    by_currency: Default::default(),
                });
            bot.total = checked(bot.total, event.amount, "bot total")?;
            bot.count += 1;
            bot.currency = event.currency.clone();
            bot.role = event.role.clone();
            bot.region = event.region.clone();
            let raw = bot.by_currency.entry(event.currency.clone()).or_default();
            *raw = checked(*raw, event.amount, "bot currency total")?;

            cycle_total = checked(cycle_total, event.amount, "cycle total")?;
        }

        staged.total_accumulated = checked(staged.total_accumulated, cycle_total, "grand total")?;
        *self = staged;

        debug!(
            events = events.len(),
            cycle_total = %cycle_total,
            total = %self.total_accumulated,
            "Ledger updated"
        );
        Ok(cycle_total)
    }

    /// Administrative reset. The only way totals ever go down.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
