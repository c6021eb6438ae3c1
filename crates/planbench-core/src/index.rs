//! Index lifecycle: baseline cleanup and index creation.

use planbench_common::{Collection, IndexSpec, Result};

/// Name of the implicit primary-key index, never dropped.
pub const PRIMARY_KEY_INDEX: &str = "_id_";

/// Drop every existing index that would interfere with a clean
/// "before" measurement for the proposed specification.
///
/// An index is interfering when its leading field matches *any* field
/// of the proposal: the planner can use such an index as a prefix to
/// partially satisfy the query, which would corrupt the
/// collection-scan baseline. Matching the leading field only mirrors
/// how index-prefix usability works in the store.
///
/// Enumeration and drop failures are logged and non-fatal: the
/// benchmark proceeds, and the log is the record of the contamination
/// risk. Returns the names of the indexes actually dropped.
pub async fn drop_conflicting(collection: &dyn Collection, spec: &IndexSpec) -> Vec<String> {
    let indexes = match collection.list_indexes().await {
        Ok(indexes) => indexes,
        Err(e) => {
            tracing::warn!(
                namespace = collection.namespace(),
                error = %e,
                "failed to enumerate indexes, baseline may be contaminated"
            );
            return Vec::new();
        }
    };

    let mut dropped = Vec::new();
    for index in indexes {
        if index.name == PRIMARY_KEY_INDEX {
            continue;
        }

        let Some(leading) = index.leading_field() else {
            continue;
        };

        if spec.contains_field(leading) {
            tracing::warn!(
                index = %index.name,
                leading,
                "dropping interfering index before baseline measurement"
            );
            match collection.drop_index(&index.name).await {
                Ok(()) => dropped.push(index.name),
                Err(e) => tracing::warn!(
                    index = %index.name,
                    error = %e,
                    "failed to drop interfering index, baseline may be contaminated"
                ),
            }
        }
    }

    dropped
}

/// Create the proposed index. Failure propagates: measuring an "after"
/// state that does not exist would be worse than aborting.
pub async fn create_index(collection: &dyn Collection, spec: &IndexSpec) -> Result<String> {
    let name = collection.create_index(spec).await?;
    tracing::info!(index = %name, spec = %spec, "created index");
    Ok(name)
}
