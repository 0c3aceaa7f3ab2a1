//! Injectable randomness.
//!
//! Revenue amounts and compliance findings are simulation stand-ins. Every
//! random draw goes through [`Entropy`] so that production uses a seeded
//! `StdRng` while tests script the exact outcomes they need.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Source of uniform draws shared by the executor and the compliance monitor.
pub trait Entropy: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize;
}

/// Random inputs taken for one bot execution before the cycle fans out.
///
/// Draws are taken in registry order on the cycle's own task, so a seeded
/// run produces the same results however the bot tasks are scheduled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunDraws {
    units: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl RunDraws {
    pub fn push_unit(&mut self, value: f64) {
        self.units.push_back(value);
    }

    pub fn push_index(&mut self, value: usize) {
        self.indices.push_back(value);
    }

    /// Next unit draw, in the order taken.
    pub fn unit(&mut self) -> Option<f64> {
        self.units.pop_front()
    }

    /// Next index draw, in the order taken.
    pub fn index(&mut self) -> Option<usize> {
        self.indices.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.indices.is_empty()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Seeded RNG
// ---------------------------------------------------------------------------

/// `StdRng`-backed entropy.
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    /// Seed from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Use `seed` when configured, otherwise the OS.
    pub fn from_config(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_os(),
        }
    }
}

impl Entropy for SeededEntropy {
    fn unit(&self) -> f64 {
        lock(&self.rng).gen::<f64>()
    }

    fn index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        lock(&self.rng).gen_range(0..len)
    }
}

// ---------------------------------------------------------------------------
// Scripted draws
// ---------------------------------------------------------------------------

/// Replays queued draws in order, then falls back to fixed values.
///
/// Used to force violation/no-violation and amount outcomes.
pub struct ScriptedEntropy {
    units: Mutex<VecDeque<f64>>,
    indices: Mutex<VecDeque<usize>>,
    fallback_unit: f64,
}

impl ScriptedEntropy {
    /// An empty script. Falls back to `0.999` (never below a small
    /// probability threshold) and index `0`.
    pub fn new() -> Self {
        Self {
            units: Mutex::new(VecDeque::new()),
            indices: Mutex::new(VecDeque::new()),
            fallback_unit: 0.999,
        }
    }

    pub fn with_fallback_unit(mut self, value: f64) -> Self {
        self.fallback_unit = value;
        self
    }

    /// Queue unit draws.
    pub fn push_units(&self, values: impl IntoIterator<Item = f64>) {
        lock(&self.units).extend(values);
    }

    /// Queue index draws.
    pub fn push_indices(&self, values: impl IntoIterator<Item = usize>) {
        lock(&self.indices).extend(values);
    }

    /// Queue the three draws of one compliance audit that finds a violation.
    pub fn push_violation(&self, type_index: usize, severity_index: usize) {
        self.push_units([0.0]);
        self.push_indices([type_index, severity_index]);
    }

    /// Queue one clean compliance audit.
    pub fn push_clean_audit(&self) {
        self.push_units([0.999]);
    }
}

impl Default for ScriptedEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl Entropy for ScriptedEntropy {
    fn unit(&self) -> f64 {
        lock(&self.units).pop_front().unwrap_or(self.fallback_unit)
    }

    fn index(&self, len: usize) -> usize {
        let next = lock(&self.indices).pop_front().unwrap_or(0);
        if len == 0 {
            0
        } else {
            next % len
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
