//! Core engine — the periodic execute → aggregate → audit loop.

pub mod executor;
pub mod cycle;
pub mod ledger;
pub mod controller;

use crate::activity::ActivityLog;
use crate::registry::BotRegistry;
use crate::types::{ComplianceState, RevenueEvent, RevenueState};

/// Everything a cycle reads or mutates, owned in one place.
///
/// The controller holds this behind a single lock; components receive it
/// explicitly instead of reaching for shared globals.
#[derive(Debug, Clone, Default)]
pub struct FleetContext {
    pub registry: BotRegistry,
    pub revenue: RevenueState,
    pub compliance: ComplianceState,
    pub log: ActivityLog,
    /// Every applied revenue event, oldest first. Append-only.
    pub records: Vec<RevenueEvent>,
    pub cycle_count: u64,
}

impl FleetContext {
    pub fn new(registry: BotRegistry, compliance: ComplianceState) -> Self {
        Self {
            registry,
            revenue: RevenueState::new(),
            compliance,
            log: ActivityLog::new(),
            records: Vec::new(),
            cycle_count: 0,
        }
    }
}
