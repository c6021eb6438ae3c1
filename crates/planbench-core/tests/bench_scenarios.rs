//! End-to-end orchestrator runs against a scripted collection.

mod support;

use planbench_common::{CandidateQuery, IndexKey, IndexSpec, IndexType, QueryKind, SortSpec};
use planbench_core::{ResultStore, run_benchmark, run_detection};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::MockCollection;

const THRESHOLD_MS: u64 = 200;

fn candidate(name: &str, query: serde_json::Value, index: IndexSpec) -> CandidateQuery {
    CandidateQuery {
        name: name.to_string(),
        query,
        sort: None,
        projection: None,
        index,
        kind: QueryKind::Find,
    }
}

fn simple(field: &str) -> IndexSpec {
    IndexSpec::new().with(field, IndexKey::Ascending)
}

#[tokio::test]
async fn slow_query_is_benchmarked_to_a_complete_record() {
    let filter = json!({"trip_time": {"$gte": 300}});
    let mock = MockCollection::new("bench.trips")
        .with_collscan_time(&filter, 450)
        .with_default_collscan_time(450);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let candidates = vec![candidate("long_trips", filter.clone(), simple("trip_time"))];
    let outcome = run_detection(&mock, &store, &candidates, THRESHOLD_MS)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert!(record.is_complete());
    assert_eq!(record.index_type, IndexType::Simple);
    assert_eq!(record.results.before.execution_time_millis, 450);

    let after = record.results.after.as_ref().unwrap();
    assert_eq!(after.execution_time_millis, 4);
    assert_eq!(after.index_name.as_deref(), Some("trip_time_1"));
    assert!(after.used_index());

    // The on-disk copy carries the after measurement too.
    let (_, stored) = store.latest_record("long_trips").unwrap().unwrap();
    assert_eq!(&stored, record);

    assert_eq!(outcome.summary.len(), 1);
    assert_eq!(outcome.summary[0].execution_time_millis, 450);
}

#[tokio::test]
async fn fast_query_is_measured_but_not_indexed() {
    let mock = MockCollection::new("bench.trips").with_default_collscan_time(120);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let candidates = vec![candidate(
        "short_trips",
        json!({"trip_miles": {"$lt": 1}}),
        simple("trip_miles"),
    )];
    let outcome = run_detection(&mock, &store, &candidates, THRESHOLD_MS)
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.len(), 1);
    assert_eq!(outcome.summary[0].query_name, "short_trips");
    assert_eq!(outcome.summary[0].execution_time_millis, 120);

    // No benchmark record was written, only the summary.
    assert!(store.latest_record("short_trips").unwrap().is_none());
    assert_eq!(store.load_summary().unwrap(), outcome.summary);

    // No index beyond the primary key was created.
    assert_eq!(mock.index_names(), vec!["_id_"]);
}

#[tokio::test]
async fn hashed_candidate_replaces_a_conflicting_index() {
    let filter = json!({"PULocationID": 132});
    let mock = MockCollection::new("bench.trips")
        .with_index("PULocationID_1", simple("PULocationID"))
        .with_index("DOLocationID_1", simple("DOLocationID"))
        .with_collscan_time(&filter, 450);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let hashed = IndexSpec::new().with("PULocationID", IndexKey::Hashed);
    let record = run_benchmark(&mock, &store, &candidate("pickup_zone", filter, hashed))
        .await
        .unwrap();

    assert_eq!(record.index_type, IndexType::Hashed);
    // The baseline ran without the old index, so it was a full scan.
    assert_eq!(record.results.before.execution_time_millis, 450);
    assert!(!record.results.before.used_index());

    let after = record.results.after.as_ref().unwrap();
    assert_eq!(after.index_name.as_deref(), Some("PULocationID_hashed"));

    // The conflicting index is gone, the unrelated one survived.
    let names = mock.index_names();
    assert!(!names.contains(&"PULocationID_1".to_string()));
    assert!(names.contains(&"DOLocationID_1".to_string()));
    assert!(names.contains(&"PULocationID_hashed".to_string()));
}

#[tokio::test]
async fn drop_failures_do_not_abort_the_benchmark() {
    let filter = json!({"trip_time": {"$gte": 300}});
    let mock = MockCollection::new("bench.trips")
        .with_index("trip_time_1", simple("trip_time"))
        .with_collscan_time(&filter, 450)
        .failing_drop();
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let record = run_benchmark(&mock, &store, &candidate("long_trips", filter, simple("trip_time")))
        .await
        .unwrap();

    // The interfering index survived the failed drop, so the baseline
    // ran against it; the sequence still completed end to end.
    assert!(record.is_complete());
    assert!(record.results.before.used_index());
    assert!(mock.index_names().contains(&"trip_time_1".to_string()));
    assert!(store.latest_record("long_trips").unwrap().unwrap().1.is_complete());
}

#[tokio::test]
async fn index_enumeration_failure_does_not_abort_the_benchmark() {
    let filter = json!({"trip_time": {"$gte": 300}});
    let mock = MockCollection::new("bench.trips")
        .with_index("trip_time_1", simple("trip_time"))
        .with_collscan_time(&filter, 450)
        .failing_list();
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let record = run_benchmark(&mock, &store, &candidate("long_trips", filter, simple("trip_time")))
        .await
        .unwrap();

    // No interfering index could be found, let alone dropped.
    assert!(record.is_complete());
    assert!(mock.index_names().contains(&"trip_time_1".to_string()));
}

#[tokio::test]
async fn interrupted_run_leaves_a_loadable_partial_record() {
    let mock = MockCollection::new("bench.trips")
        .with_default_collscan_time(450)
        .failing_when_indexed();
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let result = run_benchmark(
        &mock,
        &store,
        &candidate("long_trips", json!({"trip_time": {"$gte": 300}}), simple("trip_time")),
    )
    .await;
    assert!(result.is_err());

    // The before measurement survived on disk with an explicit null after.
    let (id, partial) = store.latest_record("long_trips").unwrap().unwrap();
    assert!(!partial.is_complete());
    assert_eq!(partial.results.before.execution_time_millis, 450);

    let raw = std::fs::read_to_string(store.record_path(&id)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["results"]["after"], serde_json::Value::Null);
}

#[tokio::test]
async fn sweep_isolates_a_failing_candidate() {
    let fast = json!({"trip_miles": {"$lt": 1}});
    let mock = MockCollection::new("bench.trips")
        .with_collscan_time(&fast, 50)
        .with_default_collscan_time(450)
        .failing_create();
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let candidates = vec![
        candidate("a_slow", json!({"trip_time": {"$gte": 300}}), simple("trip_time")),
        candidate("b_fast", fast, simple("trip_miles")),
        candidate("c_slow", json!({"request_datetime": {"$gte": "2023-01-01"}}), simple("request_datetime")),
    ];
    let outcome = run_detection(&mock, &store, &candidates, THRESHOLD_MS)
        .await
        .unwrap();

    // Index creation failed for both slow candidates, so no record
    // completed, but every baseline still made it into the summary in
    // input order.
    assert!(outcome.records.is_empty());
    let names: Vec<_> = outcome.summary.iter().map(|e| e.query_name.as_str()).collect();
    assert_eq!(names, vec!["a_slow", "b_fast", "c_slow"]);
    let times: Vec<_> = outcome
        .summary
        .iter()
        .map(|e| e.execution_time_millis)
        .collect();
    assert_eq!(times, vec![450, 50, 450]);

    // The slow candidates left partial records behind.
    assert!(!store.latest_record("a_slow").unwrap().unwrap().1.is_complete());
    assert!(!store.latest_record("c_slow").unwrap().unwrap().1.is_complete());
    assert!(store.latest_record("b_fast").unwrap().is_none());
}

#[tokio::test]
async fn sweep_benchmarks_only_the_slow_candidates() {
    let fast = json!({"trip_miles": {"$lt": 1}});
    let mock = MockCollection::new("bench.trips")
        .with_collscan_time(&fast, 50)
        .with_default_collscan_time(300);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let candidates = vec![
        candidate("a_slow", json!({"trip_time": {"$gte": 300}}), simple("trip_time")),
        candidate("b_fast", fast, simple("trip_miles")),
        candidate("c_slow", json!({"request_datetime": {"$gte": "2023-01-01"}}), simple("request_datetime")),
    ];
    let outcome = run_detection(&mock, &store, &candidates, THRESHOLD_MS)
        .await
        .unwrap();

    let benchmarked: Vec<_> = outcome.records.iter().map(|r| r.query_name.as_str()).collect();
    assert_eq!(benchmarked, vec!["a_slow", "c_slow"]);
    assert!(outcome.records.iter().all(|r| r.is_complete()));
    assert_eq!(outcome.summary.len(), 3);
}

#[tokio::test]
async fn aggregate_candidate_runs_through_the_pipeline_path() {
    let mock = MockCollection::new("bench.trips").with_default_collscan_time(450);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let candidate = CandidateQuery {
        name: "busy_bases".to_string(),
        query: json!([
            {"$match": {"dispatching_base_num": "B03404"}},
            {"$group": {"_id": "$dispatching_base_num", "trips": {"$sum": 1}}},
        ]),
        sort: None,
        projection: None,
        index: simple("dispatching_base_num"),
        kind: QueryKind::Aggregate,
    };

    let record = run_benchmark(&mock, &store, &candidate).await.unwrap();
    assert!(record.is_complete());
    let after = record.results.after.as_ref().unwrap();
    assert_eq!(after.index_name.as_deref(), Some("dispatching_base_num_1"));
}

#[tokio::test]
async fn invalid_candidate_fails_before_touching_the_store() {
    let mock = MockCollection::new("bench.trips");
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let bad = candidate("no_index", json!({"trip_time": 1}), IndexSpec::new());
    let err = run_benchmark(&mock, &store, &bad).await.unwrap_err();
    assert_eq!(err.kind(), "config_error");

    // Nothing was written.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn compound_candidate_is_classified_and_sorted() {
    let filter = json!({"dispatching_base_num": "B03404"});
    let mock = MockCollection::new("bench.trips").with_collscan_time(&filter, 450);
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());

    let compound = IndexSpec::new()
        .with("dispatching_base_num", IndexKey::Ascending)
        .with("trip_miles", IndexKey::Descending);
    let mut cq = candidate("base_by_miles", filter, compound);
    cq.sort = Some(SortSpec::new().with("trip_miles", planbench_common::Direction::Descending));

    let record = run_benchmark(&mock, &store, &cq).await.unwrap();
    assert_eq!(record.index_type, IndexType::Compound);
    let after = record.results.after.as_ref().unwrap();
    assert_eq!(
        after.index_name.as_deref(),
        Some("dispatching_base_num_1_trip_miles_-1")
    );
}
