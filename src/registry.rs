//! Bot registry.
//!
//! Holds the bot records the scheduler drives. Records are loaded once and
//! never removed during a session; only a successful run touches
//! `last_revenue` / `last_updated`.

use std::collections::HashSet;

use crate::types::{Bot, FleetError, RevenueEvent};

#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    bots: Vec<Bot>,
}

impl BotRegistry {
    /// Build a registry, rejecting duplicate or empty ids.
    pub fn new(bots: Vec<Bot>) -> Result<Self, FleetError> {
        let mut seen = HashSet::new();
        for bot in &bots {
            if bot.id.trim().is_empty() {
                return Err(FleetError::Registry("bot id must not be empty".into()));
            }
            if !seen.insert(bot.id.as_str()) {
                return Err(FleetError::Registry(format!("duplicate bot id: {}", bot.id)));
            }
        }
        Ok(Self { bots })
    }

    pub fn get(&self, id: &str) -> Option<&Bot> {
        self.bots.iter().find(|b| b.id == id)
    }

    /// Owned copy for a cycle's fan-out.
    pub fn snapshot(&self) -> Vec<Bot> {
        self.bots.clone()
    }

    /// Stamp a bot with its latest successful run.
    pub fn record_revenue(&mut self, event: &RevenueEvent) -> Result<(), FleetError> {
        let bot = self
            .bots
            .iter_mut()
            .find(|b| b.id == event.bot_id)
            .ok_or_else(|| FleetError::UnknownBot(event.bot_id.clone()))?;
        bot.last_revenue = event.amount;
        bot.last_updated = event.timestamp;
        Ok(())
    }
}
