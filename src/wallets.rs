//! Wallet book: logical purpose → destination address.
//!
//! Consulted once per bot execution. Addresses are opaque strings; no
//! cryptographic validation is attempted.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::WalletsConfig;
use crate::types::{Bot, FleetError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WalletBook {
    pub default_purpose: String,
    pub addresses: BTreeMap<String, String>,
}

impl WalletBook {
    pub fn new(default_purpose: &str, addresses: BTreeMap<String, String>) -> Self {
        Self {
            default_purpose: default_purpose.to_string(),
            addresses,
        }
    }

    pub fn from_config(cfg: &WalletsConfig) -> Self {
        Self::new(&cfg.default_purpose, cfg.addresses.clone())
    }

    pub fn address(&self, purpose: &str) -> Option<&str> {
        self.addresses.get(purpose).map(String::as_str)
    }

    /// Destination for a bot: its own purpose if set, else the default.
    pub fn destination_for(&self, bot: &Bot) -> Result<String, FleetError> {
        let purpose = bot.wallet_purpose.as_deref().unwrap_or(&self.default_purpose);
        self.address(purpose)
            .map(str::to_string)
            .ok_or_else(|| FleetError::WalletNotConfigured(purpose.to_string()))
    }

    /// Replace (or add) the address for `purpose`. Returns the previous one.
    pub fn update(&mut self, purpose: &str, address: &str) -> Result<Option<String>, FleetError> {
        let address = address.trim();
        if purpose.trim().is_empty() {
            return Err(FleetError::InvalidWallet {
                purpose: purpose.to_string(),
                reason: "purpose must not be empty".into(),
            });
        }
        if address.is_empty() || address.chars().any(char::is_whitespace) {
            return Err(FleetError::InvalidWallet {
                purpose: purpose.to_string(),
                reason: "address must be a single non-empty token".into(),
            });
        }
        Ok(self.addresses.insert(purpose.to_string(), address.to_string()))
    }
}
