//! Shared types for the revenue fleet.
//!
//! These types form the data model used across all modules.
//! They are kept free of behaviour that touches the clock or the timer so
//! that the engine, compliance and dashboard modules can depend on them
//! without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

/// Whether a bot is enabled in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Active => write!(f, "active"),
            BotStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A revenue bot record held by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub region: String,
    pub role: String,
    #[serde(default)]
    pub status: BotStatus,
    /// Amount produced by the most recent successful run.
    #[serde(default)]
    pub last_revenue: Decimal,
    pub currency: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    /// Wallet book purpose this bot pays into. `None` uses the book default.
    #[serde(default)]
    pub wallet_purpose: Option<String>,
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} / {}) {} last={} {}",
            self.id,
            self.name,
            self.role,
            self.region,
            self.status,
            self.last_revenue,
            self.currency,
        )
    }
}

impl Bot {
    /// Helper to build a test bot with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        Bot {
            id: id.to_string(),
            name: format!("Bot {id}"),
            region: "West Africa".to_string(),
            role: "marketing".to_string(),
            status: BotStatus::Active,
            last_revenue: Decimal::ZERO,
            currency: "NGN".to_string(),
            last_updated: Utc::now(),
            wallet_purpose: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fleet status
// ---------------------------------------------------------------------------

/// Fleet lifecycle status. Only the controller transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FleetStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for FleetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetStatus::Stopped => write!(f, "🔴 STOPPED"),
            FleetStatus::Running => write!(f, "🟢 RUNNING"),
            FleetStatus::Paused => write!(f, "🟡 PAUSED"),
        }
    }
}

/// Why the controller paused the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// A cycle produced at least one high-severity violation.
    ComplianceViolation,
    /// The cycle itself failed (aggregation error).
    CycleFailure(String),
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::ComplianceViolation => write!(f, "high severity compliance violation"),
            PauseReason::CycleFailure(msg) => write!(f, "cycle failure: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

/// A single successful bot execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub event_id: uuid::Uuid,
    pub bot_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub wallet: String,
    pub role: String,
    pub region: String,
    pub timestamp: DateTime<Utc>,
}

impl RevenueEvent {
    /// Build an event attributed to `bot`, stamped now.
    pub fn for_bot(bot: &Bot, amount: Decimal, currency: &str, wallet: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            bot_id: bot.id.clone(),
            amount,
            currency: currency.to_string(),
            wallet: wallet.to_string(),
            role: bot.role.clone(),
            region: bot.region.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for RevenueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} {:.2} {} ({} / {})",
            self.bot_id, self.wallet, self.amount, self.currency, self.role, self.region,
        )
    }
}

/// A bot execution that did not produce revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRun {
    pub bot_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Revenue aggregation
// ---------------------------------------------------------------------------

/// Running totals for one wallet address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletMetric {
    pub total: Decimal,
    /// Currency of the first contribution.
    pub currency: String,
    pub count: u64,
    /// Raw totals per currency, never converted.
    #[serde(default)]
    pub by_currency: BTreeMap<String, Decimal>,
}

impl WalletMetric {
    pub fn new(currency: &str) -> Self {
        Self {
            total: Decimal::ZERO,
            currency: currency.to_string(),
            count: 0,
            by_currency: BTreeMap::new(),
        }
    }
}

/// Running totals for one bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotMetric {
    pub total: Decimal,
    pub currency: String,
    pub count: u64,
    pub role: String,
    pub region: String,
    #[serde(default)]
    pub by_currency: BTreeMap<String, Decimal>,
}

/// Aggregate root of the wallet ledger.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RevenueState {
    /// Sum of every successful contribution since creation or last clear.
    pub total_accumulated: Decimal,
    pub wallet_metrics: HashMap<String, WalletMetric>,
    pub bot_metrics: HashMap<String, BotMetric>,
}

impl fmt::Display for RevenueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={:.2} | wallets={} | bots={}",
            self.total_accumulated,
            self.wallet_metrics.len(),
            self.bot_metrics.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

/// Category of a synthesized compliance violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    DataPrivacy,
    AdvertisingEthics,
    ApiUsage,
    AiEthics,
}

impl ViolationType {
    /// The full taxonomy, in draw order.
    pub const ALL: &'static [ViolationType] = &[
        ViolationType::DataPrivacy,
        ViolationType::AdvertisingEthics,
        ViolationType::ApiUsage,
        ViolationType::AiEthics,
    ];
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::DataPrivacy => write!(f, "data_privacy"),
            ViolationType::AdvertisingEthics => write!(f, "advertising_ethics"),
            ViolationType::ApiUsage => write!(f, "api_usage"),
            ViolationType::AiEthics => write!(f, "ai_ethics"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[Severity::Medium, Severity::High];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// One detected compliance issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub id: uuid::Uuid,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub description: String,
    pub rule_violated: String,
    pub action_type: String,
    pub detected_at: DateTime<Utc>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.violation_type, self.severity, self.description)
    }
}

/// Result of one audit.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceCheck {
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    pub violations_found: Vec<Violation>,
    pub compliance_score: u32,
}

impl ComplianceCheck {
    /// Whether this audit must halt the fleet.
    pub fn requires_pause(&self) -> bool {
        self.violations_found.iter().any(|v| v.severity == Severity::High)
    }
}

/// Highest possible compliance score; also the starting score.
pub const MAX_COMPLIANCE_SCORE: u32 = 100;

/// Running compliance summary plus the outstanding violations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceState {
    pub total_violations: u64,
    pub recent_violations: u64,
    pub current_score: u32,
    pub total_audits: u64,
    pub last_audit: Option<DateTime<Utc>>,
    pub violation_types: BTreeMap<ViolationType, u64>,
    pub severity_breakdown: BTreeMap<Severity, u64>,
    pub outstanding: Vec<Violation>,
}

impl ComplianceState {
    pub fn new() -> Self {
        Self {
            total_violations: 0,
            recent_violations: 0,
            current_score: MAX_COMPLIANCE_SCORE,
            total_audits: 0,
            last_audit: None,
            violation_types: BTreeMap::new(),
            severity_breakdown: BTreeMap::new(),
            outstanding: Vec::new(),
        }
    }

    /// Drop the outstanding violations. Returns how many were cleared.
    ///
    /// `total_violations` and the score are left untouched.
    pub fn clear_violations(&mut self) -> usize {
        let cleared = self.outstanding.len();
        self.outstanding.clear();
        self.recent_violations = 0;
        cleared
    }
}

impl Default for ComplianceState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        };
        write!(f, "[{}] {level} {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of a single settled cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub bots_run: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cycle_revenue: Decimal,
    pub total_accumulated: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: bots={} ok={} failed={} revenue={:.2} total={:.2}",
            self.cycle_number,
            self.bots_run,
            self.succeeded,
            self.failed,
            self.cycle_revenue,
            self.total_accumulated,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the fleet.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    #[error("Bot {bot_id} execution failed: {reason}")]
    Execution { bot_id: String, reason: String },

    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("No wallet configured for purpose: {0}")]
    WalletNotConfigured(String),

    #[error("Invalid wallet address for {purpose}: {reason}")]
    InvalidWallet { purpose: String, reason: String },

    #[error("Unknown bot: {0}")]
    UnknownBot(String),

    #[error("Registry error: {0}")]
    Registry(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
