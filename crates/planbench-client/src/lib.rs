//! planbench client library
//!
//! A small client for the document store's wire protocol, exposing the
//! handful of operations the benchmark engine needs: explain-mode query
//! execution and index catalog management.
//!
//! The benchmark engine is strictly sequential (each step depends on
//! the database state left by the previous one), so the client holds a
//! single connection behind a mutex rather than a pool.
//!
//! # Example
//!
//! ```no_run
//! use planbench_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> planbench_common::Result<()> {
//!     let client = Client::connect("localhost:6432").await?;
//!     let trips = client.collection("trips_db.fhvhv_trips");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use planbench_common::Result;
use planbench_common::protocol::{Request, Response};
use tokio::sync::Mutex;

pub use collection::RemoteCollection;
pub use connection::Connection;

mod collection;
mod connection;

/// Client for a document store speaking the planbench wire protocol.
#[derive(Clone)]
pub struct Client {
    conn: Arc<Mutex<Connection>>,
}

impl Client {
    /// Connect to a document store server using plain TCP.
    pub async fn connect(addr: &str) -> Result<Self> {
        let conn = Connection::connect(addr).await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get a handle on a collection by qualified name.
    pub fn collection(&self, namespace: impl Into<String>) -> RemoteCollection {
        RemoteCollection::new(self.clone(), namespace.into())
    }

    /// Ping the server, returning its timestamp.
    pub async fn ping(&self) -> Result<u64> {
        self.conn.lock().await.ping().await
    }

    /// Gracefully disconnect.
    pub async fn close(&self) {
        self.conn.lock().await.close().await;
    }

    pub(crate) async fn request(&self, request: Request) -> Result<Response> {
        self.conn.lock().await.send_request(request).await
    }
}
