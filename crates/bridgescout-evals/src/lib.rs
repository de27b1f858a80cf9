//! # Offline evaluation harness
//!
//! Runs a golden dataset of replay-mode resolutions through the real
//! pipeline and applies CI quality gates to the resulting run traces:
//! auto-merge precision, Tier-1 detection recall, and the persisted-identity
//! rate. A regression in any gate fails the build before it can ship.
//!
//! ```rust,no_run
//! use bridgescout_evals::{builtin_dataset, run_dataset, EvalGate, EvalGateConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let report = run_dataset(&builtin_dataset()).await?;
//! let gate = EvalGate::new(EvalGateConfig::default());
//! let result = gate.check(&report);
//! if !result.passed {
//!     for violation in &result.violations {
//!         eprintln!("gate violation: {violation}");
//!     }
//!     std::process::exit(1);
//! }
//! # Ok(())
//! # }
//! ```

mod dataset;
mod gates;
mod runner;

pub use dataset::{builtin_dataset, CaseExpectation, GoldenCase, GoldenDataset, ReplayBundle};
pub use gates::{EvalGate, EvalGateConfig, GateCheck};
pub use runner::{run_dataset, CaseResult, EvalReport};
