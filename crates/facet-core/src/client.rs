//! The store client capability.
//!
//! The data-access layer never talks to the network itself. Callers inject an
//! implementation of [`StoreClient`], typically an SDK adapter in production
//! and an in-memory store in tests.

use async_trait::async_trait;
use facet_model::StoreError;
use facet_model::input::{
    BatchGetItemInput, BatchWriteItemInput, DeleteItemInput, GetItemInput, PutItemInput,
    QueryInput,
};
use facet_model::output::{
    BatchGetItemOutput, BatchWriteItemOutput, DeleteItemOutput, GetItemOutput, PutItemOutput,
    QueryOutput,
};

/// The six store operations the data-access layer issues.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch one item by primary key.
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, StoreError>;

    /// Put one item, optionally guarded by a condition.
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, StoreError>;

    /// Delete one item, optionally guarded by a condition.
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, StoreError>;

    /// Read one page of items from a single partition.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, StoreError>;

    /// Fetch many items by key. Keys the store skipped come back unprocessed.
    async fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, StoreError>;

    /// Put or delete many items. Requests the store skipped come back
    /// unprocessed.
    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, StoreError>;
}
