//! CI quality gates over an evaluation report.

use serde::{Deserialize, Serialize};

use super::dataset::GoldenDataset;
use super::runner::EvalReport;

/// Gate thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalGateConfig {
    /// Minimum auto-merge precision. Default 1.0: a wrong auto-merge is a
    /// merge of two different people and is never acceptable.
    pub min_auto_merge_precision: f64,
    /// Minimum Tier-1 detection recall. Default 0.90.
    pub min_tier1_recall: f64,
    /// Minimum persisted-identity rate on expected-positive cases.
    pub min_persisted_rate: f64,
    /// Minimum overall case pass rate.
    pub min_case_pass_rate: f64,
}

impl Default for EvalGateConfig {
    fn default() -> Self {
        Self {
            min_auto_merge_precision: 1.0,
            min_tier1_recall: 0.90,
            min_persisted_rate: 0.90,
            min_case_pass_rate: 0.95,
        }
    }
}

impl EvalGateConfig {
    /// Set the auto-merge precision floor.
    #[must_use]
    pub fn with_min_auto_merge_precision(mut self, value: f64) -> Self {
        self.min_auto_merge_precision = value;
        self
    }

    /// Set the Tier-1 recall floor.
    #[must_use]
    pub fn with_min_tier1_recall(mut self, value: f64) -> Self {
        self.min_tier1_recall = value;
        self
    }

    /// Set the persisted-rate floor.
    #[must_use]
    pub fn with_min_persisted_rate(mut self, value: f64) -> Self {
        self.min_persisted_rate = value;
        self
    }
}

/// Result of a gate check.
#[derive(Debug)]
pub struct GateCheck {
    pub passed: bool,
    pub violations: Vec<String>,
}

/// The gate itself.
pub struct EvalGate {
    config: EvalGateConfig,
}

impl EvalGate {
    /// Gate with the given thresholds.
    #[must_use]
    pub fn new(config: EvalGateConfig) -> Self {
        Self { config }
    }

    /// Check a report against the thresholds.
    #[must_use]
    pub fn check_with_dataset(&self, report: &EvalReport, dataset: &GoldenDataset) -> GateCheck {
        let mut violations = Vec::new();

        let precision = report.auto_merge_precision();
        if precision < self.config.min_auto_merge_precision {
            violations.push(format!(
                "auto-merge precision {precision:.2} below floor {:.2}",
                self.config.min_auto_merge_precision
            ));
        }

        let recall = report.tier1_recall(dataset);
        if recall < self.config.min_tier1_recall {
            violations.push(format!(
                "tier-1 recall {recall:.2} below floor {:.2}",
                self.config.min_tier1_recall
            ));
        }

        let persisted = report.persisted_rate(dataset);
        if persisted < self.config.min_persisted_rate {
            violations.push(format!(
                "persisted-identity rate {persisted:.2} below floor {:.2}",
                self.config.min_persisted_rate
            ));
        }

        let pass_rate = report.case_pass_rate();
        if pass_rate < self.config.min_case_pass_rate {
            violations.push(format!(
                "case pass rate {pass_rate:.2} below floor {:.2}",
                self.config.min_case_pass_rate
            ));
        }

        // Funnel consistency is a hard invariant, not a threshold.
        for case in &report.cases {
            if !case.trace.totals.funnel.is_consistent() {
                violations.push(format!("case {} produced an inconsistent funnel", case.name));
            }
        }

        GateCheck {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Check using the built-in dataset (convenience for `check(&report)`
    /// call sites that ran it).
    #[must_use]
    pub fn check(&self, report: &EvalReport) -> GateCheck {
        self.check_with_dataset(report, &super::dataset::builtin_dataset())
    }
}
