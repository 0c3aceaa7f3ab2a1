//! Activity log.
//!
//! Append-only record of everything the fleet core does. Entries are kept in
//! insertion order and exposed most-recent-first. Nothing in the core reads
//! the log back to make decisions. Each entry is also mirrored to `tracing`.

use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{error, info};

use crate::types::{LogEntry, LogLevel};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityLog {
    /// Newest entry at the front.
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped now.
    pub fn append(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => info!(target: "revenue_fleet::activity", "{message}"),
            LogLevel::Error => error!(target: "revenue_fleet::activity", "{message}"),
        }
        self.entries.push_front(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Error, message);
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Up to `limit` most recent entries.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
