//! Mock executor for integration testing.
//!
//! Provides a deterministic `BotExecutor` that pays a fixed amount per bot,
//! can be told to fail individual bots, and can hold every execution for a
//! fixed (virtual) delay. It records call counts and the peak number of
//! executions in flight at once.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use revenue_fleet::engine::executor::BotExecutor;
use revenue_fleet::entropy::RunDraws;
use revenue_fleet::types::{Bot, RevenueEvent};

/// A scripted executor. All state is in-memory and controllable from tests.
pub struct MockExecutor {
    amounts: Mutex<HashMap<String, Decimal>>,
    currency: String,
    failing: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockExecutor {
    /// Pay `amount` in NGN to each listed bot id.
    pub fn new(amounts: &[(&str, Decimal)]) -> Self {
        Self {
            amounts: Mutex::new(
                amounts
                    .iter()
                    .map(|(id, amount)| (id.to_string(), *amount))
                    .collect(),
            ),
            currency: "NGN".to_string(),
            failing: Mutex::new(HashMap::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every execution for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Make every subsequent run of `bot_id` fail with `msg`.
    pub fn set_error(&self, bot_id: &str, msg: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(bot_id.to_string(), msg.to_string());
    }

    pub fn clear_error(&self, bot_id: &str) {
        self.failing.lock().unwrap().remove(bot_id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of executions that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotExecutor for MockExecutor {
    fn prepare(&self, _bot: &Bot) -> RunDraws {
        RunDraws::default()
    }

    async fn execute(&self, bot: &Bot, wallet: &str, _draws: RunDraws) -> Result<RevenueEvent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(msg) = self.failing.lock().unwrap().get(&bot.id) {
            return Err(anyhow!("{msg}"));
        }
        let amount = self
            .amounts
            .lock()
            .unwrap()
            .get(&bot.id)
            .copied()
            .ok_or_else(|| anyhow!("no amount scripted for {}", bot.id))?;

        Ok(RevenueEvent::for_bot(bot, amount, &self.currency, wallet))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bot(id: &str) -> Bot {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Bot {id}"),
            "region": "Test",
            "role": "sales",
            "currency": "NGN",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_mock_pays_scripted_amount() {
        let mock = MockExecutor::new(&[("A", dec!(100))]);
        let event = mock.execute(&bot("A"), "0xw", RunDraws::default()).await.unwrap();
        assert_eq!(event.amount, dec!(100));
        assert_eq!(event.wallet, "0xw");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let mock = MockExecutor::new(&[("A", dec!(100))]);
        mock.set_error("A", "provider down");
        let err = mock.execute(&bot("A"), "0xw", RunDraws::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "provider down");

        mock.clear_error("A");
        assert!(mock.execute(&bot("A"), "0xw", RunDraws::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_unscripted_bot_fails() {
        let mock = MockExecutor::new(&[]);
        assert!(mock.execute(&bot("Z"), "0xw", RunDraws::default()).await.is_err());
    }
}
