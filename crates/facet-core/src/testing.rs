//! Test doubles shared by the unit tests.

use std::sync::Arc;

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

use crate::client::StoreClient;

/// A client whose every call fails with a transport error.
#[derive(Debug)]
pub(crate) struct OfflineClient;

pub(crate) fn offline_client() -> Arc<dyn StoreClient> {
    Arc::new(OfflineClient)
}

fn offline() -> StoreError {
    StoreError::transport("store is offline")
}

#[async_trait]
impl StoreClient for OfflineClient {
    async fn get_item(&self, _: GetItemInput) -> Result<GetItemOutput, StoreError> {
        Err(offline())
    }

    async fn put_item(&self, _: PutItemInput) -> Result<PutItemOutput, StoreError> {
        Err(offline())
    }

    async fn delete_item(&self, _: DeleteItemInput) -> Result<DeleteItemOutput, StoreError> {
        Err(offline())
    }

    async fn query(&self, _: QueryInput) -> Result<QueryOutput, StoreError> {
        Err(offline())
    }

    async fn batch_get_item(&self, _: BatchGetItemInput) -> Result<BatchGetItemOutput, StoreError> {
        Err(offline())
    }

    async fn batch_write_item(
        &self,
        _: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, StoreError> {
        Err(offline())
    }
}
