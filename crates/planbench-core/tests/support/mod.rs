//! Scripted in-memory collection for orchestrator tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use planbench_common::{
    BenchError, Collection, IndexKey, IndexModel, IndexSpec, Result, SortSpec,
};
use serde_json::{Value, json};

/// A fake collection with a real index catalog and canned explain
/// payloads: a query runs as a collection scan until an index whose
/// leading field appears in the filter exists, then as an index scan.
pub struct MockCollection {
    namespace: String,
    state: Mutex<MockState>,
}

struct MockState {
    indexes: Vec<IndexModel>,
    /// Collection-scan time per filter (keyed by canonical JSON).
    collscan_ms: HashMap<String, u64>,
    default_collscan_ms: u64,
    ixscan_ms: u64,
    /// Simulate an interruption: explain fails once a usable index exists.
    fail_when_indexed: bool,
    /// Simulate a store rejecting index creation.
    fail_create: bool,
    /// Simulate a store refusing to enumerate its index catalog.
    fail_list: bool,
    /// Simulate a store refusing to drop any index.
    fail_drop: bool,
}

impl MockCollection {
    pub fn new(namespace: &str) -> Self {
        let primary = IndexModel {
            name: "_id_".into(),
            key: IndexSpec::new().with("_id", IndexKey::Ascending),
        };
        Self {
            namespace: namespace.to_string(),
            state: Mutex::new(MockState {
                indexes: vec![primary],
                collscan_ms: HashMap::new(),
                default_collscan_ms: 450,
                ixscan_ms: 4,
                fail_when_indexed: false,
                fail_create: false,
                fail_list: false,
                fail_drop: false,
            }),
        }
    }

    pub fn with_index(self, name: &str, key: IndexSpec) -> Self {
        self.state.lock().unwrap().indexes.push(IndexModel {
            name: name.to_string(),
            key,
        });
        self
    }

    pub fn with_collscan_time(self, filter: &Value, ms: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .collscan_ms
            .insert(filter.to_string(), ms);
        self
    }

    pub fn with_default_collscan_time(self, ms: u64) -> Self {
        self.state.lock().unwrap().default_collscan_ms = ms;
        self
    }

    pub fn failing_when_indexed(self) -> Self {
        self.state.lock().unwrap().fail_when_indexed = true;
        self
    }

    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn failing_list(self) -> Self {
        self.state.lock().unwrap().fail_list = true;
        self
    }

    pub fn failing_drop(self) -> Self {
        self.state.lock().unwrap().fail_drop = true;
        self
    }

    pub fn index_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .indexes
            .iter()
            .map(|i| i.name.clone())
            .collect()
    }

    fn explain(&self, filter_fields: &[String], filter_echo: &Value) -> Result<Value> {
        let state = self.state.lock().unwrap();

        let usable = state.indexes.iter().find(|index| {
            index.name != "_id_"
                && index
                    .leading_field()
                    .is_some_and(|leading| filter_fields.iter().any(|f| f == leading))
        });

        match usable {
            Some(index) => {
                if state.fail_when_indexed {
                    return Err(BenchError::Network(
                        "connection reset during explain".into(),
                    ));
                }
                Ok(ixscan_payload(
                    &self.namespace,
                    filter_echo,
                    &index.name,
                    state.ixscan_ms,
                ))
            }
            None => {
                let ms = state
                    .collscan_ms
                    .get(&filter_echo.to_string())
                    .copied()
                    .unwrap_or(state.default_collscan_ms);
                Ok(collscan_payload(&self.namespace, filter_echo, ms))
            }
        }
    }
}

#[async_trait]
impl Collection for MockCollection {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn explain_find(
        &self,
        filter: &Value,
        _sort: Option<&SortSpec>,
        _projection: Option<&Value>,
    ) -> Result<Value> {
        let fields = object_fields(filter);
        self.explain(&fields, filter)
    }

    async fn explain_aggregate(&self, pipeline: &[Value]) -> Result<Value> {
        // The first $match stage decides index usability.
        let matched = pipeline
            .iter()
            .find_map(|stage| stage.get("$match"))
            .cloned()
            .unwrap_or_else(|| json!({}));
        let fields = object_fields(&matched);
        self.explain(&fields, &matched)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexModel>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(BenchError::Index("listIndexes not authorized".into()));
        }
        Ok(state.indexes.clone())
    }

    async fn create_index(&self, key: &IndexSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(BenchError::Index("index build rejected".into()));
        }

        let name = index_name(key);
        state.indexes.push(IndexModel {
            name: name.clone(),
            key: key.clone(),
        });
        Ok(name)
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_drop {
            return Err(BenchError::Index(format!("cannot drop {name}: index busy")));
        }
        let before = state.indexes.len();
        state.indexes.retain(|index| index.name != name);
        if state.indexes.len() == before {
            return Err(BenchError::NotFound(format!("no index named {name}")));
        }
        Ok(())
    }
}

fn object_fields(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

fn index_name(key: &IndexSpec) -> String {
    key.fields()
        .map(|(field, k)| {
            let marker = match k {
                IndexKey::Ascending => "1",
                IndexKey::Descending => "-1",
                IndexKey::Hashed => "hashed",
            };
            format!("{field}_{marker}")
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn collscan_payload(namespace: &str, filter: &Value, ms: u64) -> Value {
    json!({
        "queryPlanner": {
            "namespace": namespace,
            "parsedQuery": filter,
            "optimizationTimeMillis": 2,
            "rejectedPlans": [],
        },
        "executionStats": {
            "executionSuccess": true,
            "nReturned": 1200,
            "executionTimeMillis": ms,
            "totalDocsExamined": 1000000,
            "totalKeysExamined": 0,
            "executionStages": {
                "stage": "COLLSCAN",
                "docsExamined": 1000000,
            },
        },
    })
}

fn ixscan_payload(namespace: &str, filter: &Value, index_name: &str, ms: u64) -> Value {
    json!({
        "queryPlanner": {
            "namespace": namespace,
            "parsedQuery": filter,
            "optimizationTimeMillis": 1,
            "rejectedPlans": [{"stage": "COLLSCAN"}],
        },
        "executionStats": {
            "executionSuccess": true,
            "nReturned": 1200,
            "executionTimeMillis": ms,
            "totalDocsExamined": 1200,
            "totalKeysExamined": 1200,
            "executionStages": {
                "stage": "FETCH",
                "docsExamined": 1200,
                "inputStage": {
                    "stage": "IXSCAN",
                    "indexName": index_name,
                    "indexBounds": {},
                    "keysExamined": 1200,
                },
            },
        },
    })
}
