//! Explain-mode execution of a candidate query.

use serde_json::Value;

use planbench_common::{BenchError, CandidateQuery, Collection, QueryKind, Result, SortSpec};

use crate::metrics::ExplainMetrics;

/// The exact query shape under measurement.
///
/// The same shape must be measured before and after index creation;
/// explaining a differently-shaped query would make the comparison
/// meaningless.
#[derive(Debug, Clone, Copy)]
pub struct QueryShape<'a> {
    pub filter: &'a Value,
    pub sort: Option<&'a SortSpec>,
    pub projection: Option<&'a Value>,
    pub kind: QueryKind,
}

impl<'a> QueryShape<'a> {
    pub fn of(candidate: &'a CandidateQuery) -> Self {
        Self {
            filter: &candidate.query,
            sort: candidate.sort.as_ref(),
            projection: candidate.projection.as_ref(),
            kind: candidate.kind,
        }
    }

    fn validate(&self) -> Result<()> {
        match self.kind {
            QueryKind::Find => {
                if !self.filter.is_object() {
                    return Err(BenchError::Config(
                        "find query must be a predicate object".into(),
                    ));
                }
            }
            QueryKind::Aggregate => {
                if self.sort.is_some() {
                    return Err(BenchError::Config(
                        "sort cannot be combined with an aggregation pipeline".into(),
                    ));
                }
                if !self.filter.is_array() {
                    return Err(BenchError::Config(
                        "aggregate query must be a pipeline array".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Run the query in explain mode and reduce the report to metrics.
///
/// Read-only against the store. Configuration errors fail before any
/// database call; database and payload errors surface to the caller
/// unretried (retry policy belongs to the orchestrator).
pub async fn run_explain(
    collection: &dyn Collection,
    shape: &QueryShape<'_>,
) -> Result<ExplainMetrics> {
    shape.validate()?;

    let payload = match shape.kind {
        QueryKind::Find => {
            collection
                .explain_find(shape.filter, shape.sort, shape.projection)
                .await?
        }
        QueryKind::Aggregate => {
            // Validated above: the filter is the pipeline array.
            let pipeline = shape.filter.as_array().map(Vec::as_slice).unwrap_or(&[]);
            collection.explain_aggregate(pipeline).await?
        }
    };

    let metrics = ExplainMetrics::from_payload(&payload)?;
    tracing::debug!(
        namespace = collection.namespace(),
        execution_time_millis = metrics.execution_time_millis,
        docs_examined = metrics.total_docs_examined,
        index = metrics.index_name.as_deref().unwrap_or("<collscan>"),
        "explain completed"
    );

    Ok(metrics)
}
