//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime by [`crate::credentials::ApiKeys::from_env`].

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::time::Duration;

use crate::types::Bot;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub fleet: FleetConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    pub credentials: CredentialsConfig,
    pub wallets: WalletsConfig,
    #[serde(default)]
    pub bots: Vec<Bot>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FleetConfig {
    pub name: String,
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Issue a start command on boot.
    #[serde(default)]
    pub autostart: bool,
}

fn default_cycle_interval_secs() -> u64 {
    10
}

impl FleetConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    pub currencies: Vec<String>,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Probability that a simulated run fails.
    #[serde(default)]
    pub failure_rate: f64,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            currencies: vec!["NGN".into(), "USD".into(), "EUR".into()],
            min_amount: dec!(50000),
            max_amount: dec!(100000),
            failure_rate: 0.0,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplianceConfig {
    pub violation_probability: f64,
    pub score_penalty: u32,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            violation_probability: 0.05,
            score_penalty: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// Env var holding the payment-provider secret required to start.
    pub payment_key_env: String,
    pub storefront_key_env: Option<String>,
    pub marketplace_key_env: Option<String>,
    pub target_site_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletsConfig {
    pub default_purpose: String,
    pub addresses: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

/// Read-side currency display. Never consulted by the ledger.
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub reference_currency: String,
    pub conversion_rates: BTreeMap<String, Decimal>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let mut conversion_rates = BTreeMap::new();
        conversion_rates.insert("NGN".to_string(), dec!(1));
        conversion_rates.insert("USD".to_string(), dec!(780));
        conversion_rates.insert("EUR".to_string(), dec!(850));
        Self {
            reference_currency: "NGN".into(),
            conversion_rates,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the fleet cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fleet.cycle_interval_secs == 0 {
            bail!("fleet.cycle_interval_secs must be greater than zero");
        }
        if self.execution.currencies.is_empty() {
            bail!("execution.currencies must not be empty");
        }
        if self.execution.min_amount <= Decimal::ZERO {
            bail!("execution.min_amount must be positive");
        }
        if self.execution.min_amount > self.execution.max_amount {
            bail!(
                "execution.min_amount ({}) exceeds max_amount ({})",
                self.execution.min_amount,
                self.execution.max_amount
            );
        }
        if !(0.0..=1.0).contains(&self.execution.failure_rate) {
            bail!("execution.failure_rate must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.compliance.violation_probability) {
            bail!("compliance.violation_probability must be within [0, 1]");
        }
        let mut seen = HashSet::new();
        for bot in &self.bots {
            if !seen.insert(bot.id.as_str()) {
                bail!("duplicate bot id in config: {}", bot.id);
            }
        }
        Ok(())
    }
}
