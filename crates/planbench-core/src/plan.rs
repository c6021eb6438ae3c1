//! Execution-plan stage tree normalization.
//!
//! The store's explain report nests plan stages as untyped mappings
//! with heterogeneous field sets per operator type, linked through
//! `inputStage` (linear pipelines) and `inputStages` (fan-in, e.g. a
//! merge of parallel scans). `normalize` walks that shape into a
//! uniform tree: a typed stage tag, typed child links, and an open
//! extension bag preserving every operator-specific field verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use planbench_common::{BenchError, Result};

/// Stage tag of an index scan.
pub const INDEX_SCAN: &str = "IXSCAN";
/// Stage tag of a full collection scan.
pub const COLLECTION_SCAN: &str = "COLLSCAN";

/// A plan tree deeper than this is a cyclic or corrupt payload: real
/// plans are bounded by the number of distinct operator types in a
/// single query (typically <= 6).
pub const MAX_PLAN_DEPTH: usize = 32;

/// One node of an execution-plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStage {
    pub stage: String,

    #[serde(rename = "inputStage", default, skip_serializing_if = "Option::is_none")]
    pub input_stage: Option<Box<PlanStage>>,

    #[serde(rename = "inputStages", default, skip_serializing_if = "Vec::is_empty")]
    pub input_stages: Vec<PlanStage>,

    /// Operator-specific fields (documents examined, index name, bounds,
    /// memory estimate, ...), preserved verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PlanStage {
    pub fn is_index_scan(&self) -> bool {
        self.stage == INDEX_SCAN
    }

    pub fn is_collection_scan(&self) -> bool {
        self.stage == COLLECTION_SCAN
    }

    /// Look up an operator-specific field on this node.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Normalize a raw explain stage mapping into a [`PlanStage`] tree.
///
/// Every field is preserved verbatim; `inputStage` and `inputStages`
/// are recursively normalized (both are traversed when both appear, as
/// some merge operators emit both). Non-mapping input or nesting past
/// [`MAX_PLAN_DEPTH`] is a data-contract violation and fails fast.
pub fn normalize(raw: &Value) -> Result<PlanStage> {
    normalize_at(raw, 0)
}

fn normalize_at(raw: &Value, depth: usize) -> Result<PlanStage> {
    if depth > MAX_PLAN_DEPTH {
        return Err(BenchError::Explain(format!(
            "plan tree exceeds depth {MAX_PLAN_DEPTH}; cyclic or corrupt explain payload"
        )));
    }

    let object = raw.as_object().ok_or_else(|| {
        BenchError::Explain(format!("plan stage is not an object: {raw}"))
    })?;

    let mut stage = String::new();
    let mut input_stage = None;
    let mut input_stages = Vec::new();
    let mut fields = Map::new();

    for (key, value) in object {
        match key.as_str() {
            "stage" => {
                stage = value
                    .as_str()
                    .ok_or_else(|| {
                        BenchError::Explain(format!("stage tag is not a string: {value}"))
                    })?
                    .to_string();
            }
            "inputStage" => {
                input_stage = Some(Box::new(normalize_at(value, depth + 1)?));
            }
            "inputStages" => {
                let children = value.as_array().ok_or_else(|| {
                    BenchError::Explain(format!("inputStages is not an array: {value}"))
                })?;
                input_stages = children
                    .iter()
                    .map(|child| normalize_at(child, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
            }
            _ => {
                fields.insert(key.clone(), value.clone());
            }
        }
    }

    if stage.is_empty() {
        return Err(BenchError::Explain(format!(
            "plan stage has no stage tag: {raw}"
        )));
    }

    Ok(PlanStage {
        stage,
        input_stage,
        input_stages,
        fields,
    })
}

/// Find the index name and bounds of the first index-scan stage in the
/// tree, in traversal order: current node, then `input_stage`, then
/// each of `input_stages` left to right.
///
/// Returns `(None, None)` when no index scan exists anywhere, i.e.
/// the query was answered by a full collection scan.
pub fn extract_index_info(tree: &PlanStage) -> (Option<String>, Option<Value>) {
    match first_index_scan(tree) {
        Some(scan) => (
            scan.field("indexName")
                .and_then(Value::as_str)
                .map(str::to_string),
            scan.field("indexBounds").cloned(),
        ),
        None => (None, None),
    }
}

fn first_index_scan(stage: &PlanStage) -> Option<&PlanStage> {
    if stage.is_index_scan() {
        return Some(stage);
    }

    if let Some(inner) = &stage.input_stage
        && let Some(hit) = first_index_scan(inner)
    {
        return Some(hit);
    }

    stage.input_stages.iter().find_map(first_index_scan)
}
