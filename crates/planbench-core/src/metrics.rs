//! Fixed-shape reduction of a raw explain report.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use planbench_common::{BenchError, Result};

use crate::plan::{self, PlanStage};

/// The normalized measurement of a single explain-mode query execution.
///
/// Serialized field names follow the store's explain vocabulary so the
/// persisted records read like the reports they were reduced from.
/// `index_name` is non-null exactly when some node of the plan tree is
/// an index scan; null means the query ran as a full collection scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainMetrics {
    pub namespace: Option<String>,
    pub parsed_query: Option<Value>,
    pub optimization_time_millis: Option<u64>,
    #[serde(default)]
    pub rejected_plans: u64,
    pub execution_success: bool,
    pub n_returned: u64,
    pub execution_time_millis: u64,
    pub total_docs_examined: u64,
    pub total_keys_examined: u64,
    pub execution_stages: PlanStage,
    pub index_name: Option<String>,
    pub index_bounds: Option<Value>,
    pub memory_usage_bytes_estimate: Option<u64>,
    pub sort_pattern: Option<Value>,
}

impl ExplainMetrics {
    /// Reduce a raw explain report to its metrics.
    ///
    /// Planner-level fields are optional (older servers omit some);
    /// the execution-statistics block and its counters are required.
    /// A report without them is malformed and surfaces as an error
    /// rather than a half-filled record.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let planner = required_object(payload, "queryPlanner")?;
        let stats = required_object(payload, "executionStats")?;

        let stages_raw = stats.get("executionStages").ok_or_else(|| {
            BenchError::Explain("executionStats.executionStages is missing".into())
        })?;
        let execution_stages = plan::normalize(stages_raw)?;
        let (index_name, index_bounds) = plan::extract_index_info(&execution_stages);

        let memory_usage_bytes_estimate = execution_stages
            .field("maxMemoryUsageBytes")
            .and_then(Value::as_u64);

        Ok(Self {
            namespace: planner
                .get("namespace")
                .and_then(Value::as_str)
                .map(str::to_string),
            parsed_query: planner.get("parsedQuery").cloned(),
            optimization_time_millis: planner
                .get("optimizationTimeMillis")
                .and_then(Value::as_u64),
            rejected_plans: planner
                .get("rejectedPlans")
                .and_then(Value::as_array)
                .map_or(0, |plans| plans.len() as u64),
            execution_success: stats
                .get("executionSuccess")
                .and_then(Value::as_bool)
                .ok_or_else(|| {
                    BenchError::Explain("executionStats.executionSuccess is missing".into())
                })?,
            n_returned: required_u64(stats, "nReturned")?,
            execution_time_millis: required_u64(stats, "executionTimeMillis")?,
            total_docs_examined: required_u64(stats, "totalDocsExamined")?,
            total_keys_examined: required_u64(stats, "totalKeysExamined")?,
            execution_stages,
            index_name,
            index_bounds,
            memory_usage_bytes_estimate,
            sort_pattern: payload.get("sortPattern").cloned(),
        })
    }

    /// Whether the winning plan used an index at all.
    pub fn used_index(&self) -> bool {
        self.index_name.is_some()
    }
}

fn required_object<'a>(payload: &'a Value, key: &str) -> Result<&'a Map<String, Value>> {
    payload
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| BenchError::Explain(format!("explain payload is missing {key}")))
}

fn required_u64(stats: &Map<String, Value>, key: &str) -> Result<u64> {
    stats.get(key).and_then(Value::as_u64).ok_or_else(|| {
        BenchError::Explain(format!("executionStats.{key} is missing or not a number"))
    })
}
