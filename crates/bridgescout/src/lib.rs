//! # BridgeScout
//!
//! BridgeScout resolves a LinkedIn candidate seed — a URL slug plus the
//! public SERP title and snippet that pointed at it — into a ranked set of
//! platform identity candidates (GitHub, npm, PyPI, Kaggle, ORCID, Google
//! Scholar, Crunchbase, Dribbble, Medium, ...), each with an
//! evidence-backed confidence breakdown and a bridge tier that tells the
//! caller whether the match may be auto-merged, needs human review, or is
//! only a weak suggestion.
//!
//! The engine never scrapes LinkedIn. Everything it knows comes from
//! public SERP data and official platform APIs.
//!
//! ## Architecture
//!
//! ```text
//! enqueue ──► queue ──► worker ──► pipeline
//!                                    │ load        (hints)
//!                                    │ reverse-link(plan + search)
//!                                    │ github      (native API)
//!                                    │ fan-out     (platform adapters)
//!                                    │ aggregate   (score + gate)
//!                                    │ persist     (upsert)
//!                                    └ trace       (session record)
//! ```
//!
//! - [`hints`] — SERP parsing into typed, confidence-tagged hints
//! - [`plan`] — query planning under confidence gates and a budget
//! - [`search`] — provider seam, token buckets, retry, replay transport
//! - [`score`] — weighted scoring, bridge tiers, the persistence gate
//! - [`sources`] — platform adapters and URL routing
//! - [`pipeline`] — the per-candidate state machine
//! - [`queue`] — durable jobs and the worker pool
//! - [`store`] — candidates, identities, sessions
//! - [`trace`] — structured run traces for observability and CI gates
//!
//! ## Example (replay mode)
//!
//! ```rust,no_run
//! use bridgescout::api::{EnrichOptions, EnrichmentService};
//! use bridgescout::queue::MemoryQueue;
//! use bridgescout::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> bridgescout::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let queue = Arc::new(MemoryQueue::new());
//! let service = EnrichmentService::new(store, queue);
//! let receipt = service.enrich("t1", "c1", EnrichOptions::default()).await?;
//! println!("queued session {}", receipt.session_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod hints;
pub mod model;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod queue;
pub mod score;
pub mod search;
pub mod sources;
pub mod store;
pub mod trace;

pub use error::{Error, Result};
