//! Dataset execution over the real pipeline in replay mode.

use chrono::Utc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

use bridgescout::model::{
    BridgeTier, ConfidenceBucket, EnrichmentBudget, EnrichmentSession, JobType,
};
use bridgescout::pipeline::{DiscoveryPipeline, PipelineDeps};
use bridgescout::progress::ProgressBus;
use bridgescout::score::GateConfig;
use bridgescout::search::{RateLimit, ReplayTransport, SearchExecutor};
use bridgescout::sources::{default_sources, GithubDiscoveryConfig};
use bridgescout::store::{MemoryStore, Store};
use bridgescout::trace::RunTrace;
use bridgescout::Result;

use super::dataset::{GoldenCase, GoldenDataset};

/// Outcome of one case.
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub passed: bool,
    /// Human-readable mismatch descriptions.
    pub mismatches: Vec<String>,
    pub persisted: u32,
    pub found_tier1: bool,
    pub top_auto_merge: bool,
    pub trace: RunTrace,
}

/// Aggregated report, consumed by the CI gates.
#[derive(Debug)]
pub struct EvalReport {
    pub cases: Vec<CaseResult>,
}

impl EvalReport {
    /// Fraction of auto-merge classifications that were expected to be
    /// auto-merges. 1.0 when nothing auto-merged.
    #[must_use]
    pub fn auto_merge_precision(&self) -> f64 {
        let produced: Vec<&CaseResult> =
            self.cases.iter().filter(|c| c.top_auto_merge).collect();
        if produced.is_empty() {
            return 1.0;
        }
        let correct = produced.iter().filter(|c| c.passed).count();
        correct as f64 / produced.len() as f64
    }

    /// Fraction of expected Tier-1 cases where a Tier-1 was detected.
    #[must_use]
    pub fn tier1_recall(&self, dataset: &GoldenDataset) -> f64 {
        let expected: Vec<&GoldenCase> =
            dataset.cases.iter().filter(|c| c.expect.tier1).collect();
        if expected.is_empty() {
            return 1.0;
        }
        let hit = expected
            .iter()
            .filter(|case| {
                self.cases
                    .iter()
                    .any(|r| r.name == case.name && r.found_tier1)
            })
            .count();
        hit as f64 / expected.len() as f64
    }

    /// Fraction of cases that persisted exactly what was expected.
    #[must_use]
    pub fn case_pass_rate(&self) -> f64 {
        if self.cases.is_empty() {
            return 1.0;
        }
        let passed = self.cases.iter().filter(|c| c.passed).count();
        passed as f64 / self.cases.len() as f64
    }

    /// Fraction of expected-persisting cases that persisted anything.
    #[must_use]
    pub fn persisted_rate(&self, dataset: &GoldenDataset) -> f64 {
        let expected: Vec<&GoldenCase> = dataset
            .cases
            .iter()
            .filter(|c| c.expect.persisted > 0)
            .collect();
        if expected.is_empty() {
            return 1.0;
        }
        let persisted = expected
            .iter()
            .filter(|case| {
                self.cases
                    .iter()
                    .any(|r| r.name == case.name && r.persisted > 0)
            })
            .count();
        persisted as f64 / expected.len() as f64
    }
}

/// Run one case through a freshly wired replay pipeline.
async fn run_case(case: &GoldenCase) -> Result<CaseResult> {
    let store = Arc::new(MemoryStore::new());
    store.put_candidate(&case.candidate).await?;

    let executor = Arc::new(
        SearchExecutor::builder()
            .provider(
                Arc::new(ReplayTransport::new("replay", case.fixtures.web.clone())),
                RateLimit {
                    requests_per_second: 10_000.0,
                    burst_capacity: 10_000,
                },
            )
            .build(),
    );
    let pipeline = DiscoveryPipeline::new(PipelineDeps {
        store: store.clone() as Arc<dyn Store>,
        executor: executor.clone(),
        github: Arc::new(case.fixtures.github.clone()),
        sources: default_sources(executor),
        gate: GateConfig::default(),
        github_config: GithubDiscoveryConfig::default(),
        reverse_link_budget: 5,
        progress: ProgressBus::default(),
    });

    let mut session = EnrichmentSession::queued(
        format!("eval_{}", case.name),
        &case.candidate.tenant_id,
        &case.candidate.id,
        JobType::Enrich,
        case.role_type,
        EnrichmentBudget::default(),
        Utc::now(),
    );
    let outcome = pipeline
        .resolve(&mut session, &AtomicBool::new(false))
        .await?;

    let persisted = outcome.persisted.len() as u32;
    let found_tier1 = outcome
        .persisted
        .iter()
        .any(|i| i.bridge_tier == BridgeTier::Tier1);
    let top_auto_merge = outcome
        .persisted
        .first()
        .is_some_and(|i| i.confidence_bucket == ConfidenceBucket::AutoMerge);

    let mut mismatches = Vec::new();
    if persisted != case.expect.persisted {
        mismatches.push(format!(
            "persisted {persisted}, expected {}",
            case.expect.persisted
        ));
    }
    if found_tier1 != case.expect.tier1 {
        mismatches.push(format!(
            "tier1 detection was {found_tier1}, expected {}",
            case.expect.tier1
        ));
    }
    if top_auto_merge != case.expect.auto_merge {
        mismatches.push(format!(
            "auto-merge was {top_auto_merge}, expected {}",
            case.expect.auto_merge
        ));
    }

    Ok(CaseResult {
        name: case.name.clone(),
        passed: mismatches.is_empty(),
        mismatches,
        persisted,
        found_tier1,
        top_auto_merge,
        trace: outcome.trace,
    })
}

/// Run the whole dataset, case by case.
pub async fn run_dataset(dataset: &GoldenDataset) -> Result<EvalReport> {
    let mut cases = Vec::with_capacity(dataset.cases.len());
    for case in &dataset.cases {
        let result = run_case(case).await?;
        info!(
            case = %result.name,
            passed = result.passed,
            persisted = result.persisted,
            "eval case finished"
        );
        cases.push(result);
    }
    Ok(EvalReport { cases })
}
