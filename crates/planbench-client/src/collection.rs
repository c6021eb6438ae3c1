//! `Collection` implementation over the wire protocol.

use async_trait::async_trait;
use planbench_common::{
    BenchError, Collection, IndexModel, IndexSpec, Result, SortSpec,
    protocol::{Request, Response},
};
use serde_json::Value;

use crate::Client;

/// A remote collection reached through a [`Client`].
pub struct RemoteCollection {
    client: Client,
    namespace: String,
}

impl RemoteCollection {
    pub(crate) fn new(client: Client, namespace: String) -> Self {
        Self { client, namespace }
    }
}

#[async_trait]
impl Collection for RemoteCollection {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn explain_find(
        &self,
        filter: &Value,
        sort: Option<&SortSpec>,
        projection: Option<&Value>,
    ) -> Result<Value> {
        let request = Request::ExplainFind {
            collection: self.namespace.clone(),
            filter: filter.clone(),
            sort: sort.cloned(),
            projection: projection.cloned(),
        };

        match self.client.request(request).await? {
            Response::Explain { payload } => Ok(payload),
            Response::Error { message, .. } => Err(BenchError::Explain(message)),
            other => Err(unexpected("explain_find", &other)),
        }
    }

    async fn explain_aggregate(&self, pipeline: &[Value]) -> Result<Value> {
        let request = Request::ExplainAggregate {
            collection: self.namespace.clone(),
            pipeline: pipeline.to_vec(),
        };

        match self.client.request(request).await? {
            Response::Explain { payload } => Ok(payload),
            Response::Error { message, .. } => Err(BenchError::Explain(message)),
            other => Err(unexpected("explain_aggregate", &other)),
        }
    }

    async fn list_indexes(&self) -> Result<Vec<IndexModel>> {
        let request = Request::ListIndexes {
            collection: self.namespace.clone(),
        };

        match self.client.request(request).await? {
            Response::IndexList { indexes } => Ok(indexes),
            Response::Error { message, .. } => Err(BenchError::Index(message)),
            other => Err(unexpected("list_indexes", &other)),
        }
    }

    async fn create_index(&self, key: &IndexSpec) -> Result<String> {
        let request = Request::CreateIndex {
            collection: self.namespace.clone(),
            key: key.clone(),
        };

        match self.client.request(request).await? {
            Response::IndexCreated { name } => Ok(name),
            Response::Error { message, .. } => Err(BenchError::Index(message)),
            other => Err(unexpected("create_index", &other)),
        }
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        let request = Request::DropIndex {
            collection: self.namespace.clone(),
            name: name.to_string(),
        };

        match self.client.request(request).await? {
            Response::IndexDropped { .. } | Response::Ok => Ok(()),
            Response::Error { message, .. } => Err(BenchError::Index(message)),
            other => Err(unexpected("drop_index", &other)),
        }
    }
}

fn unexpected(operation: &str, response: &Response) -> BenchError {
    BenchError::Protocol(format!(
        "unexpected response to {operation}: {response:?}"
    ))
}
