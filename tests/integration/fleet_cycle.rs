//! End-to-end fleet scenarios.
//!
//! Drives the public controller API against the mock executor and scripted
//! entropy. Timer-driven tests run on paused tokio time, so intervals and
//! execution delays elapse instantly and deterministically.

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    use revenue_fleet::config::AppConfig;
    use revenue_fleet::credentials::ApiKeys;
    use revenue_fleet::engine::controller::{CycleOutcome, FleetController};
    use revenue_fleet::engine::executor::SimulatedExecutor;
    use revenue_fleet::entropy::{ScriptedEntropy, SeededEntropy};
    use revenue_fleet::types::{
        FleetError, FleetStatus, LogLevel, PauseReason, RevenueEvent, Severity,
    };

    use crate::mock_executor::MockExecutor;

    const CONFIG: &str = r#"
[fleet]
name = "IT-FLEET"
cycle_interval_secs = 10

[compliance]
violation_probability = 0.05
score_penalty = 15

[credentials]
payment_key_env = "PAYSTACK_SECRET_KEY"

[wallets]
default_purpose = "usdt_bsc"

[wallets.addresses]
usdt_bsc = "0x3f8d463512f100b62e5d1f543be170acaeac8114"
btc = "18FmB4VDrx4Gtj9ud547ci9HyD7q5TdaGW"

[[bots]]
id = "A"
name = "Marketing Bot West Africa"
region = "West Africa"
role = "marketing"
currency = "NGN"

[[bots]]
id = "B"
name = "Sales Bot Europe"
region = "Europe"
role = "sales"
currency = "EUR"
wallet_purpose = "btc"
"#;

    const USDT: &str = "0x3f8d463512f100b62e5d1f543be170acaeac8114";
    const BTC: &str = "18FmB4VDrx4Gtj9ud547ci9HyD7q5TdaGW";

    fn config() -> AppConfig {
        AppConfig::from_toml_str(CONFIG).unwrap()
    }

    fn fleet(executor: Arc<MockExecutor>, entropy: Arc<ScriptedEntropy>) -> FleetController {
        FleetController::from_config(
            &config(),
            executor,
            entropy,
            Arc::new(ApiKeys::with_payment(Some("sk_test_123"))),
        )
        .unwrap()
    }

    fn paying_100_200() -> Arc<MockExecutor> {
        MockExecutor::new(&[("A", dec!(100)), ("B", dec!(200))]).into_shared()
    }

    // -- Aggregation ---------------------------------------------------------

    #[tokio::test]
    async fn test_single_cycle_aggregates_per_wallet_and_bot() {
        let fleet = fleet(paying_100_200(), Arc::new(ScriptedEntropy::new()));

        let outcome = fleet.run_cycle_once().await;

        let report = outcome.report().unwrap();
        assert_eq!(report.cycle_revenue, dec!(300));
        assert_eq!(report.succeeded, 2);

        let revenue = fleet.revenue().await;
        assert_eq!(revenue.total_accumulated, dec!(300));
        assert_eq!(revenue.wallet_metrics[USDT].total, dec!(100));
        assert_eq!(revenue.wallet_metrics[USDT].count, 1);
        assert_eq!(revenue.wallet_metrics[BTC].total, dec!(200));
        assert_eq!(revenue.bot_metrics["A"].role, "marketing");
        assert_eq!(revenue.bot_metrics["B"].region, "Europe");

        let bots = fleet.bots().await;
        assert_eq!(bots[1].last_revenue, dec!(200));
        assert!(fleet
            .logs(10)
            .await
            .iter()
            .any(|e| e.message == "Cycle completed. Total revenue: 300.00"));
    }

    #[tokio::test]
    async fn test_totals_stay_consistent_with_simulated_executor() {
        let cfg = config();
        let entropy = Arc::new(SeededEntropy::seeded(7));
        let executor = SimulatedExecutor::new(&cfg.execution, entropy.clone());
        let fleet = FleetController::from_config(
            &cfg,
            Arc::new(executor),
            entropy,
            Arc::new(ApiKeys::with_payment(Some("sk"))),
        )
        .unwrap();

        for _ in 0..10 {
            fleet.run_cycle_once().await;
        }

        let revenue = fleet.revenue().await;
        let by_wallet: Decimal = revenue.wallet_metrics.values().map(|m| m.total).sum();
        let by_bot: Decimal = revenue.bot_metrics.values().map(|m| m.total).sum();
        assert_eq!(by_wallet, revenue.total_accumulated);
        assert_eq!(by_bot, revenue.total_accumulated);
        assert_eq!(revenue.bot_metrics["A"].count, 10);
        assert!(revenue.total_accumulated >= dec!(50000) * dec!(20));
        // Manual cycles never change the lifecycle state.
        assert_eq!(fleet.status().await, FleetStatus::Stopped);
        assert_eq!(fleet.compliance().await.total_audits, 10);
    }

    fn seeded_fleet(seed: u64, bots: usize) -> FleetController {
        let mut cfg = config();
        cfg.execution.failure_rate = 0.2;
        let template = cfg.bots[0].clone();
        cfg.bots = (0..bots)
            .map(|i| {
                let mut bot = template.clone();
                bot.id = format!("BOT-{i:02}");
                if i % 3 == 0 {
                    bot.wallet_purpose = Some("btc".into());
                }
                bot
            })
            .collect();
        let entropy = Arc::new(SeededEntropy::seeded(seed));
        let executor = SimulatedExecutor::new(&cfg.execution, entropy.clone());
        FleetController::from_config(
            &cfg,
            Arc::new(executor),
            entropy,
            Arc::new(ApiKeys::with_payment(Some("sk"))),
        )
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_seed_same_outcome_across_threads() {
        let first = seeded_fleet(42, 32);
        let second = seeded_fleet(42, 32);

        for _ in 0..5 {
            first.run_cycle_once().await;
            second.run_cycle_once().await;
        }

        assert_eq!(first.revenue().await, second.revenue().await);
        let (a, b) = (first.compliance().await, second.compliance().await);
        assert_eq!(a.total_violations, b.total_violations);
        assert_eq!(a.current_score, b.current_score);

        let key = |records: Vec<RevenueEvent>| {
            records
                .into_iter()
                .map(|r| (r.bot_id, r.amount, r.currency, r.wallet))
                .collect::<Vec<_>>()
        };
        let a = key(first.revenue_records(usize::MAX).await);
        let b = key(second.revenue_records(usize::MAX).await);
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    // -- Lifecycle -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_without_credential() {
        let fleet = FleetController::from_config(
            &config(),
            paying_100_200(),
            Arc::new(ScriptedEntropy::new()),
            Arc::new(ApiKeys::with_payment(None)),
        )
        .unwrap();

        let err = assert_err!(fleet.start().await);
        assert!(matches!(err, FleetError::MissingCredential(_)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fleet.status().await, FleetStatus::Stopped);
        assert_eq!(fleet.cycle_count().await, 0);

        let logs = fleet.logs(10).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_run_on_interval() {
        let fleet = fleet(paying_100_200(), Arc::new(ScriptedEntropy::new()));
        assert_ok!(fleet.start().await);

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(fleet.cycle_count().await, 2);
        assert_eq!(fleet.revenue().await.total_accumulated, dec!(600));

        assert!(fleet.stop().await);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fleet.cycle_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_high_severity_violation_pauses_fleet() {
        let entropy = Arc::new(ScriptedEntropy::new());
        entropy.push_clean_audit();
        entropy.push_violation(3, 1);
        let fleet = fleet(paying_100_200(), entropy);
        assert_ok!(fleet.start().await);

        tokio::time::sleep(Duration::from_secs(45)).await;

        assert_eq!(fleet.status().await, FleetStatus::Paused);
        assert_eq!(fleet.cycle_count().await, 2);
        // The violating cycle's revenue is kept.
        assert_eq!(fleet.revenue().await.total_accumulated, dec!(600));

        let compliance = fleet.compliance().await;
        assert_eq!(compliance.current_score, 85);
        assert_eq!(compliance.total_audits, 2);
        let violations = fleet.violations().await;
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);

        // A paused fleet is not stoppable; only start resumes it.
        assert!(!fleet.stop().await);
        assert_ok!(fleet.start().await);
        assert_eq!(fleet.status().await, FleetStatus::Running);
        fleet.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_cycle_settle() {
        let executor = MockExecutor::new(&[("A", dec!(100)), ("B", dec!(200))])
            .with_delay(Duration::from_secs(5))
            .into_shared();
        let fleet = fleet(executor.clone(), Arc::new(ScriptedEntropy::new()));
        assert_ok!(fleet.start().await);

        // First tick at 10s; executions are held until 15s.
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(fleet.cycle_count().await, 1);
        assert_eq!(fleet.revenue().await.total_accumulated, Decimal::ZERO);

        assert!(fleet.stop().await);

        assert_eq!(fleet.status().await, FleetStatus::Stopped);
        assert_eq!(fleet.revenue().await.total_accumulated, dec!(300));
        assert_eq!(executor.calls(), 2);
    }

    // -- Concurrency ---------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_bots_execute_concurrently() {
        let executor = MockExecutor::new(&[("A", dec!(100)), ("B", dec!(200))])
            .with_delay(Duration::from_secs(5))
            .into_shared();
        let fleet = fleet(executor.clone(), Arc::new(ScriptedEntropy::new()));

        let started = tokio::time::Instant::now();
        fleet.run_cycle_once().await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(executor.peak_in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_never_overlap() {
        let executor = MockExecutor::new(&[("A", dec!(100)), ("B", dec!(200))])
            .with_delay(Duration::from_secs(25))
            .into_shared();
        let fleet = fleet(executor.clone(), Arc::new(ScriptedEntropy::new()));
        assert_ok!(fleet.start().await);

        tokio::time::sleep(Duration::from_secs(100)).await;
        // A manual cycle queues behind the timer's cycle instead of overlapping.
        fleet.run_cycle_once().await;
        fleet.stop().await;

        assert_eq!(executor.peak_in_flight(), 2);
        let cycles = fleet.cycle_count().await as usize;
        assert!(cycles >= 3);
        assert_eq!(executor.calls(), cycles * 2);
        let revenue = fleet.revenue().await;
        assert_eq!(revenue.total_accumulated, dec!(300) * Decimal::from(cycles as u64));
    }

    // -- Failure isolation ---------------------------------------------------

    #[tokio::test]
    async fn test_one_failing_bot_does_not_abort_cycle() {
        let executor = paying_100_200();
        executor.set_error("B", "payment provider timeout");
        let fleet = fleet(executor.clone(), Arc::new(ScriptedEntropy::new()));
        assert_ok!(fleet.start().await);

        let outcome = fleet.run_cycle_once().await;

        assert!(matches!(outcome, CycleOutcome::Settled { .. }));
        let revenue = fleet.revenue().await;
        assert_eq!(revenue.total_accumulated, dec!(100));
        assert!(!revenue.wallet_metrics.contains_key(BTC));
        let records = fleet.revenue_records(10).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bot_id, "A");
        assert_eq!(fleet.status().await, FleetStatus::Running);
        assert!(fleet
            .logs(20)
            .await
            .iter()
            .any(|e| e.level == LogLevel::Error
                && e.message == "Error running bot B: payment provider timeout"));

        executor.clear_error("B");
        fleet.run_cycle_once().await;
        assert_eq!(fleet.revenue().await.total_accumulated, dec!(400));
        assert_eq!(fleet.revenue_records(10).await.len(), 3);
        fleet.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_amount_discards_cycle_and_pauses() {
        let executor = MockExecutor::new(&[("A", dec!(100)), ("B", Decimal::ZERO)]).into_shared();
        let fleet = fleet(executor, Arc::new(ScriptedEntropy::new()));
        assert_ok!(fleet.start().await);

        let outcome = fleet.run_cycle_once().await;

        assert!(matches!(
            outcome,
            CycleOutcome::Halted { reason: PauseReason::CycleFailure(_), .. }
        ));
        assert_eq!(fleet.status().await, FleetStatus::Paused);
        assert_eq!(fleet.revenue().await.total_accumulated, Decimal::ZERO);
        // A is valid on its own but the whole cycle was discarded.
        assert!(fleet.revenue_records(10).await.is_empty());
    }

    // -- Compliance ----------------------------------------------------------

    #[tokio::test]
    async fn test_score_floors_at_zero_and_clear_keeps_history() {
        let entropy = Arc::new(ScriptedEntropy::new());
        for _ in 0..7 {
            entropy.push_violation(0, 0);
        }
        let fleet = fleet(paying_100_200(), entropy);

        for _ in 0..7 {
            fleet.run_cycle_once().await;
        }

        let compliance = fleet.compliance().await;
        assert_eq!(compliance.current_score, 0);
        assert_eq!(compliance.total_violations, 7);
        assert_eq!(compliance.recent_violations, 7);

        assert_eq!(fleet.clear_violations().await, 7);
        let compliance = fleet.compliance().await;
        assert_eq!(compliance.recent_violations, 0);
        assert_eq!(compliance.total_violations, 7);
        assert_eq!(compliance.current_score, 0);
        assert!(fleet.violations().await.is_empty());
    }

    // -- Wallets -------------------------------------------------------------

    #[tokio::test]
    async fn test_wallet_update_applies_to_next_cycle() {
        let executor = MockExecutor::new(&[("A", dec!(100)), ("B", dec!(200))])
            .with_currency("USD")
            .into_shared();
        let fleet = fleet(executor, Arc::new(ScriptedEntropy::new()));

        fleet.run_cycle_once().await;
        assert_ok!(fleet.set_wallet_address("btc", "bc1qnewaddress").await);
        fleet.run_cycle_once().await;

        let revenue = fleet.revenue().await;
        assert_eq!(revenue.wallet_metrics[BTC].total, dec!(200));
        assert_eq!(revenue.wallet_metrics["bc1qnewaddress"].total, dec!(200));
        assert_eq!(revenue.wallet_metrics["bc1qnewaddress"].currency, "USD");
        let updates = fleet
            .logs(100)
            .await
            .into_iter()
            .filter(|e| e.message == "Wallet address for btc updated")
            .count();
        assert_eq!(updates, 1);
    }
}
