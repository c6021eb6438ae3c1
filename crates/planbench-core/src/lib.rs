//! planbench benchmark engine
//!
//! Detects slow queries against a document-store collection, creates
//! compensating indexes, and records before/after execution-plan
//! metrics for later visualization.
//!
//! The engine is strictly sequential: interfering indexes must be gone
//! before the "before" measurement, and the proposed index must exist
//! before the "after" measurement, so every step blocks on the previous
//! one and candidates never run concurrently. The collection's index
//! catalog is assumed to have no other writers during a run.
//!
//! Modules:
//! * `plan`: normalizes the nested execution-plan tree from an explain report.
//! * `metrics`: reduces a raw explain report to a fixed-shape metrics record.
//! * `explain`: runs a candidate query in explain mode.
//! * `index`: index lifecycle (conflict cleanup, creation).
//! * `record`: persisted before/after comparison shapes.
//! * `store`: JSON result files on disk.
//! * `bench`: the benchmark orchestrator (single run and detection sweep).

pub mod bench;
pub mod explain;
pub mod index;
pub mod metrics;
pub mod plan;
pub mod record;
pub mod store;

pub use bench::{DetectionOutcome, run_benchmark, run_detection};
pub use explain::{QueryShape, run_explain};
pub use metrics::ExplainMetrics;
pub use plan::PlanStage;
pub use record::{BenchmarkRecord, BenchmarkResults, SummaryEntry};
pub use store::ResultStore;
