//! Persisted before/after comparison shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use planbench_common::{IndexSpec, IndexType};

use crate::metrics::ExplainMetrics;

/// One before/after comparison unit, persisted as a JSON document and
/// consumed later by the visualization layer.
///
/// A record with `results.after == null` is a benchmark interrupted
/// between phases: a detectable, resumable partial state, never a
/// half-filled object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub query_name: String,
    pub index_param: IndexSpec,
    pub index_type: IndexType,
    pub results: BenchmarkResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub before: ExplainMetrics,
    pub after: Option<ExplainMetrics>,
}

impl BenchmarkRecord {
    /// Start a record from the "before" measurement; `after` stays null
    /// until the second phase completes.
    pub fn new(query_name: impl Into<String>, index_param: IndexSpec, before: ExplainMetrics) -> Self {
        let index_type = index_param.index_type();
        Self {
            query_name: query_name.into(),
            index_param,
            index_type,
            results: BenchmarkResults { before, after: None },
        }
    }

    /// Whether both phases completed.
    pub fn is_complete(&self) -> bool {
        self.results.after.is_some()
    }
}

/// One line of the detection sweep's execution-time summary, recorded
/// for every candidate whether or not an index was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub query_name: String,
    pub query: Value,
    #[serde(rename = "executionTimeMillis")]
    pub execution_time_millis: u64,
    pub index_type: IndexType,
}
