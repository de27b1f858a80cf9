//! `bridgescout replay-eval` — run the golden dataset and gate on it.

use anyhow::{Context, Result};
use clap::Args;

use bridgescout_evals::{
    builtin_dataset, run_dataset, EvalGate, EvalGateConfig, GoldenDataset,
};

#[derive(Args)]
pub struct ReplayEvalArgs {
    /// Path to a golden dataset JSON file; defaults to the built-in set.
    #[arg(long)]
    dataset: Option<String>,

    /// Minimum Tier-1 recall (default 0.90).
    #[arg(long)]
    min_tier1_recall: Option<f64>,

    /// Minimum persisted-identity rate (default 0.90).
    #[arg(long)]
    min_persisted_rate: Option<f64>,
}

pub async fn run(args: ReplayEvalArgs) -> Result<()> {
    let dataset = match &args.dataset {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read dataset at {path}"))?;
            GoldenDataset::from_json(&raw).context("invalid dataset")?
        }
        None => builtin_dataset(),
    };

    let report = run_dataset(&dataset).await?;

    println!("{:<28} {:>6} {:>9} {:>6}", "case", "pass", "persisted", "tier1");
    for case in &report.cases {
        println!(
            "{:<28} {:>6} {:>9} {:>6}",
            case.name,
            if case.passed { "ok" } else { "FAIL" },
            case.persisted,
            case.found_tier1,
        );
        for mismatch in &case.mismatches {
            println!("    - {mismatch}");
        }
    }
    println!();
    println!("auto-merge precision: {:.2}", report.auto_merge_precision());
    println!("tier-1 recall:        {:.2}", report.tier1_recall(&dataset));
    println!("persisted rate:       {:.2}", report.persisted_rate(&dataset));

    let mut config = EvalGateConfig::default();
    if let Some(value) = args.min_tier1_recall {
        config = config.with_min_tier1_recall(value);
    }
    if let Some(value) = args.min_persisted_rate {
        config = config.with_min_persisted_rate(value);
    }
    let check = EvalGate::new(config).check_with_dataset(&report, &dataset);
    if !check.passed {
        for violation in &check.violations {
            eprintln!("gate violation: {violation}");
        }
        std::process::exit(1);
    }
    println!("all gates passed");
    Ok(())
}
