//! The `Collection` trait abstracting the target document collection.
//!
//! Every benchmark component takes the collection as an explicit
//! argument rather than reaching for a shared handle, so tests can
//! inject a scripted implementation with canned explain payloads.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::model::{IndexModel, IndexSpec, SortSpec};

/// A document-store collection exposing explain-with-statistics
/// execution and index catalog management.
///
/// All query-side methods are read-only against the store; only
/// `create_index` and `drop_index` mutate state.
#[async_trait]
pub trait Collection: Send + Sync {
    /// The fully qualified namespace, e.g. `trips_db.fhvhv_trips`.
    fn namespace(&self) -> &str;

    /// Run a find-style query in explain mode and return the raw
    /// explain report. The filter, sort, and projection must be exactly
    /// the shape under test.
    async fn explain_find(
        &self,
        filter: &Value,
        sort: Option<&SortSpec>,
        projection: Option<&Value>,
    ) -> Result<Value>;

    /// Run an aggregation pipeline in explain mode and return the raw
    /// explain report.
    async fn explain_aggregate(&self, pipeline: &[Value]) -> Result<Value>;

    /// Enumerate the currently defined indexes, including the implicit
    /// primary-key index.
    async fn list_indexes(&self) -> Result<Vec<IndexModel>>;

    /// Create an index and return the name assigned by the store.
    async fn create_index(&self, key: &IndexSpec) -> Result<String>;

    /// Drop an index by name.
    async fn drop_index(&self, name: &str) -> Result<()>;
}
