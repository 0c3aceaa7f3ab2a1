//! Compliance monitor.
//!
//! Invoked once per cycle after the ledger update. Each invocation is one
//! audit: it always bumps `total_audits` and `last_audit`. With a small
//! probability a single violation is synthesized and the score drops by a
//! fixed penalty, floored at zero. The monitor never raises the score.
//!
//! Real rule evaluation is out of scope; this is a stand-in driven by the
//! injected [`Entropy`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ComplianceConfig;
use crate::entropy::Entropy;
use crate::types::{ComplianceCheck, ComplianceState, Severity, Violation, ViolationType};

pub struct ComplianceMonitor {
    entropy: Arc<dyn Entropy>,
    violation_probability: f64,
    penalty: u32,
}

impl ComplianceMonitor {
    pub fn new(cfg: &ComplianceConfig, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            entropy,
            violation_probability: cfg.violation_probability,
            penalty: cfg.score_penalty,
        }
    }

    /// Run one audit and fold its outcome into `state`.
    pub fn evaluate(&self, state: &mut ComplianceState) -> ComplianceCheck {
        let now = Utc::now();
        state.total_audits += 1;
        state.last_audit = Some(now);

        let mut violations_found = Vec::new();
        if self.entropy.unit() < self.violation_probability {
            let violation_type = ViolationType::ALL[self.entropy.index(ViolationType::ALL.len())];
            let severity = Severity::ALL[self.entropy.index(Severity::ALL.len())];
            violations_found.push(Violation {
                id: uuid::Uuid::new_v4(),
                violation_type,
                severity,
                description: "Potential compliance issue detected".to_string(),
                rule_violated: "unknown".to_string(),
                action_type: "ai_decision".to_string(),
                detected_at: now,
            });
            state.current_score = state.current_score.saturating_sub(self.penalty);
        }

        for v in &violations_found {
            state.total_violations += 1;
            state.recent_violations += 1;
            *state.violation_types.entry(v.violation_type).or_default() += 1;
            *state.severity_breakdown.entry(v.severity).or_default() += 1;
            state.outstanding.push(v.clone());
        }

        let check = ComplianceCheck {
            audit_id: format!("audit_{}", now.timestamp_millis()),
            timestamp: now,
            violations_found,
            compliance_score: state.current_score,
        };

        if check.violations_found.is_empty() {
            info!(
                audit_id = %check.audit_id,
                score = state.current_score,
                audits = state.total_audits,
                "Compliance audit clean"
            );
        } else {
            warn!(
                audit_id = %check.audit_id,
                score = state.current_score,
                violations = check.violations_found.len(),
                pause = check.requires_pause(),
                "Compliance violation detected"
            );
        }

        check
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
