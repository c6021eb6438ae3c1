//! Benchmark orchestration: single before/after runs and the
//! slow-query detection sweep.

use planbench_common::{BenchError, CandidateQuery, Collection, Result};

use crate::explain::{self, QueryShape};
use crate::index;
use crate::metrics::ExplainMetrics;
use crate::record::{BenchmarkRecord, SummaryEntry};
use crate::store::ResultStore;

/// Outcome of a detection sweep.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// Completed before/after records, one per slow candidate.
    pub records: Vec<BenchmarkRecord>,
    /// Before-only summary, one entry per input candidate in input
    /// order, regardless of which candidates were skipped.
    pub summary: Vec<SummaryEntry>,
}

/// Benchmark one candidate end to end.
///
/// Sequence, each step blocking on the previous: drop interfering
/// indexes, measure before, persist the partial record, create the
/// proposed index, measure after with the identical shape, rewrite the
/// record. A failure after the partial record was written leaves it on
/// disk with `after = null` as the visible failure marker.
pub async fn run_benchmark(
    collection: &dyn Collection,
    store: &ResultStore,
    candidate: &CandidateQuery,
) -> Result<BenchmarkRecord> {
    candidate.validate()?;

    let before = measure_baseline(collection, candidate).await?;
    complete_benchmark(collection, store, candidate, before).await
}

/// Run the detection sweep: measure every candidate's baseline in
/// input order, and take the slow ones (strictly above the threshold)
/// through the full before/after sequence. Candidate failures are
/// logged and isolated; the sweep always moves to the next candidate.
/// The execution-time summary is persisted once, after the sweep.
pub async fn run_detection(
    collection: &dyn Collection,
    store: &ResultStore,
    candidates: &[CandidateQuery],
    threshold_ms: u64,
) -> Result<DetectionOutcome> {
    tracing::info!(
        namespace = collection.namespace(),
        candidates = candidates.len(),
        threshold_ms,
        "starting slow query detection"
    );

    let mut records = Vec::new();
    let mut summary = Vec::new();

    for candidate in candidates {
        match bench_candidate(collection, store, candidate, threshold_ms, &mut summary).await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => tracing::error!(
                query = %candidate.name,
                error = %e,
                "candidate benchmark aborted, moving to the next one"
            ),
        }
    }

    store.write_summary(&summary)?;
    tracing::info!(
        benchmarked = records.len(),
        measured = summary.len(),
        "slow query detection finished"
    );

    Ok(DetectionOutcome { records, summary })
}

async fn bench_candidate(
    collection: &dyn Collection,
    store: &ResultStore,
    candidate: &CandidateQuery,
    threshold_ms: u64,
    summary: &mut Vec<SummaryEntry>,
) -> Result<Option<BenchmarkRecord>> {
    candidate.validate()?;

    let before = measure_baseline(collection, candidate).await?;
    let before_ms = before.execution_time_millis;

    // Every measured candidate gets a summary entry, skipped or not.
    summary.push(SummaryEntry {
        query_name: candidate.name.clone(),
        query: candidate.query.clone(),
        execution_time_millis: before_ms,
        index_type: candidate.index.index_type(),
    });

    if before_ms <= threshold_ms {
        tracing::info!(
            query = %candidate.name,
            before_ms,
            threshold_ms,
            "query is fast, skipping index creation"
        );
        return Ok(None);
    }

    tracing::warn!(
        query = %candidate.name,
        before_ms,
        threshold_ms,
        index = %candidate.index,
        "slow query detected, creating the proposed index"
    );

    complete_benchmark(collection, store, candidate, before)
        .await
        .map(Some)
}

/// Clean the baseline and measure the "before" half.
async fn measure_baseline(
    collection: &dyn Collection,
    candidate: &CandidateQuery,
) -> Result<ExplainMetrics> {
    let dropped = index::drop_conflicting(collection, &candidate.index).await;
    if !dropped.is_empty() {
        tracing::info!(query = %candidate.name, ?dropped, "cleared interfering indexes");
    }

    let shape = QueryShape::of(candidate);
    let before = explain::run_explain(collection, &shape)
        .await
        .or_else(|e| abort(candidate, "before-explain", e))?;

    tracing::info!(
        query = %candidate.name,
        before_ms = before.execution_time_millis,
        "baseline measured"
    );
    Ok(before)
}

/// Steps 3-6: persist the partial record, create the index, measure
/// "after", rewrite the record.
async fn complete_benchmark(
    collection: &dyn Collection,
    store: &ResultStore,
    candidate: &CandidateQuery,
    before: ExplainMetrics,
) -> Result<BenchmarkRecord> {
    let mut record = BenchmarkRecord::new(&candidate.name, candidate.index.clone(), before);
    let id = store
        .create_record(&record)
        .or_else(|e| abort(candidate, "persist-before", e))?;

    index::create_index(collection, &candidate.index)
        .await
        .or_else(|e| abort(candidate, "create-index", e))?;

    let shape = QueryShape::of(candidate);
    let after = explain::run_explain(collection, &shape)
        .await
        .or_else(|e| abort(candidate, "after-explain", e))?;

    tracing::info!(
        query = %candidate.name,
        after_ms = after.execution_time_millis,
        index = after.index_name.as_deref().unwrap_or("<collscan>"),
        "after measurement complete"
    );

    record.results.after = Some(after);
    store
        .update_after(&id, &record)
        .or_else(|e| abort(candidate, "persist-after", e))?;

    Ok(record)
}

fn abort<T>(candidate: &CandidateQuery, phase: &str, err: BenchError) -> Result<T> {
    tracing::error!(query = %candidate.name, phase, error = %err, "benchmark step failed");
    Err(err)
}
