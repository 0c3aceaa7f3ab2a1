//! Read-side currency display.
//!
//! Converts the ledger's raw per-currency totals into a single reference
//! currency for presentation. Rates come from `[display]` in config and are
//! approximations; nothing here feeds back into the ledger.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::DisplayConfig;
use crate::types::RevenueState;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConvertedTotal {
    pub count: u64,
    pub raw: BTreeMap<String, Decimal>,
    /// Value in the reference currency, over convertible currencies only.
    pub reference_value: Decimal,
    /// Currencies with no configured rate.
    pub unconverted: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueDisplay {
    pub reference_currency: String,
    pub total_reference_value: Decimal,
    pub wallets: BTreeMap<String, ConvertedTotal>,
    pub bots: BTreeMap<String, ConvertedTotal>,
}

fn convert(count: u64, raw: &BTreeMap<String, Decimal>, cfg: &DisplayConfig) -> ConvertedTotal {
    let mut reference_value = Decimal::ZERO;
    let mut unconverted = Vec::new();
    for (currency, amount) in raw {
        match cfg.conversion_rates.get(currency) {
            Some(rate) => reference_value += amount * rate,
            None => unconverted.push(currency.clone()),
        }
    }
    ConvertedTotal {
        count,
        raw: raw.clone(),
        reference_value: reference_value.round_dp(2),
        unconverted,
    }
}

impl RevenueDisplay {
    pub fn from_state(state: &RevenueState, cfg: &DisplayConfig) -> Self {
        let wallets: BTreeMap<_, _> = state
            .wallet_metrics
            .iter()
            .map(|(addr, m)| (addr.clone(), convert(m.count, &m.by_currency, cfg)))
            .collect();
        let bots = state
            .bot_metrics
            .iter()
            .map(|(id, m)| (id.clone(), convert(m.count, &m.by_currency, cfg)))
            .collect();
        let total_reference_value = wallets.values().map(|w| w.reference_value).sum();

        Self {
            reference_currency: cfg.reference_currency.clone(),
            total_reference_value,
            wallets,
            bots,
        }
    }
}
