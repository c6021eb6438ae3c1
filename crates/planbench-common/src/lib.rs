//! Common library for planbench
//!
//! Shared types used by the benchmark engine, the wire client, and the CLI.
//!
//! Modules:
//! * `error`: Defines error types and handling.
//! * `model`: Candidate queries, index specifications, and catalog entries.
//! * `protocol`: The communication protocol between client and document store.
//! * `collection`: The `Collection` trait abstracting the target collection.

pub mod collection;
pub mod error;
pub mod model;
pub mod protocol;

// Re-export commonly used types at the base
pub use collection::Collection;
pub use error::*;
pub use model::{
    CandidateQuery, Direction, IndexKey, IndexModel, IndexSpec, IndexType, QueryKind, SortSpec,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
