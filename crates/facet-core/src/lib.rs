//! Single-table data access for a key-value/wide-column store.
//!
//! Many record types share one physical table. Each type is described by a
//! [`Facet`]: how its partition and sort keys are composed from record
//! fields, which of the twenty generic secondary index slots it fills, how
//! long it lives and how it is encoded. On top of that the crate provides a
//! condition compiler, single-partition range queries with opaque cursors,
//! and a batch engine that chunks, deduplicates and retries unprocessed
//! items.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use facet_core::{Facet, KeyConfiguration, StoreClient};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     email: String,
//! }
//!
//! fn users(client: Arc<dyn StoreClient>) -> Facet<User> {
//!     Facet::new(
//!         "User",
//!         "app-table",
//!         client,
//!         KeyConfiguration::new("USER").field("id", |u: &User| u.id.clone()),
//!         KeyConfiguration::new("PROFILE"),
//!     )
//! }
//! ```

pub mod batch;
pub mod client;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod expression;
pub mod facet;
pub mod index;
pub mod key;
pub mod query;
pub mod shard;

#[cfg(test)]
mod testing;

pub use batch::{BatchFailure, BatchGetResult, BatchWriteResult};
pub use client::StoreClient;
pub use codec::{RecordCodec, SerdeCodec};
pub use config::{BatchPolicy, FacetConfig};
pub use error::{FacetError, FacetResult};
pub use expression::{CompareOp, CompiledExpression, Condition, Operator};
pub use facet::{Facet, IndexHandle, WriteOutcome};
pub use index::{IndexDescriptor, IndexSlot};
pub use key::{KeyConfiguration, KeyField, KeyValue, ShardConfiguration};
pub use query::{PartitionQuery, QueryOptions, QueryPage, SortKeyBound};
