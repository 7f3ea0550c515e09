//! Bulk puts, deletes and gets.
//!
//! Records are split into chunks no larger than the store accepts, chunks
//! are sent concurrently, and within each chunk the items the store reports
//! as unprocessed are re-sent with exponential backoff until the policy's
//! retry budget is spent. A batch call never fails as a whole: every record
//! ends up either succeeded or failed with its own error.

use std::collections::{HashMap, HashSet};

use facet_model::input::{BatchGetItemInput, BatchWriteItemInput};
use facet_model::types::{KeysAndAttributes, WriteRequest};
use facet_model::{AttributeValue, Item, Key};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::{BatchPolicy, MAX_GET_BATCH, MAX_WRITE_BATCH};
use crate::error::FacetError;
use crate::facet::{Facet, PARTITION_KEY, SORT_KEY};

/// A record that could not be processed, and why.
#[derive(Debug)]
pub struct BatchFailure<T> {
    /// The input record.
    pub record: T,
    /// What went wrong.
    pub error: FacetError,
}

/// Result of `put_many` / `delete_many`.
///
/// Every input record appears exactly once, in `succeeded` or in `failed`.
#[derive(Debug)]
pub struct BatchWriteResult<T> {
    /// Records the store confirmed.
    pub succeeded: Vec<T>,
    /// Records that were rejected or never processed.
    pub failed: Vec<BatchFailure<T>>,
}

impl<T> BatchWriteResult<T> {
    /// Returns `true` when at least one record failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl<T> Default for BatchWriteResult<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Result of `get_many`.
///
/// Keys with no stored item are simply absent from `records`.
#[derive(Debug)]
pub struct BatchGetResult<T> {
    /// Decoded records, one per distinct key found.
    pub records: Vec<T>,
    /// Input records whose lookup failed.
    pub failed: Vec<BatchFailure<T>>,
}

impl<T> BatchGetResult<T> {
    /// Returns `true` when at least one lookup failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl<T> Default for BatchGetResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failed: Vec::new(),
        }
    }
}

type KeyId = (String, String);

fn key_id(attributes: &HashMap<String, AttributeValue>) -> Option<KeyId> {
    Some((
        attributes.get(PARTITION_KEY)?.as_s()?.to_owned(),
        attributes.get(SORT_KEY)?.as_s()?.to_owned(),
    ))
}

fn chunked<T>(records: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::new();
    let mut iter = records.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Put,
    Delete,
}

/// One distinct key of a write chunk and the input records that map to it.
#[derive(Debug)]
struct PendingWrite {
    id: KeyId,
    request: WriteRequest,
    owners: Vec<usize>,
}

/// One distinct key of a get chunk and the input records that map to it.
#[derive(Debug)]
struct PendingGet {
    id: KeyId,
    key: Key,
    owners: Vec<usize>,
}

impl<T> Facet<T> {
    /// Put many records. Records with the same key in one chunk collapse to
    /// the last one.
    pub async fn put_many(&self, records: Vec<T>) -> BatchWriteResult<T> {
        self.write_many(records, WriteKind::Put).await
    }

    /// Delete many records by key.
    pub async fn delete_many(&self, records: Vec<T>) -> BatchWriteResult<T> {
        self.write_many(records, WriteKind::Delete).await
    }

    /// Fetch many records by key. Each input only needs its key fields set.
    pub async fn get_many(&self, records: Vec<T>) -> BatchGetResult<T> {
        let policy = self.config().get;
        let chunks = chunked(records, policy.chunk_size(MAX_GET_BATCH));
        debug!(facet = %self.name(), chunks = chunks.len(), "dispatching batch get");

        let outcomes = join_all(
            chunks
                .into_iter()
                .enumerate()
                .map(|(chunk, records)| self.get_chunk(chunk, records, policy)),
        )
        .await;

        let mut result = BatchGetResult::default();
        for outcome in outcomes {
            result.records.extend(outcome.records);
            result.failed.extend(outcome.failed);
        }
        debug!(
            facet = %self.name(),
            found = result.records.len(),
            failed = result.failed.len(),
            "batch get finished"
        );
        result
    }

    async fn write_many(&self, records: Vec<T>, kind: WriteKind) -> BatchWriteResult<T> {
        let policy = self.config().write;
        let chunks = chunked(records, policy.chunk_size(MAX_WRITE_BATCH));
        debug!(facet = %self.name(), ?kind, chunks = chunks.len(), "dispatching batch write");

        let outcomes = join_all(
            chunks
                .into_iter()
                .enumerate()
                .map(|(chunk, records)| self.write_chunk(chunk, records, kind, policy)),
        )
        .await;

        let mut result = BatchWriteResult::default();
        for outcome in outcomes {
            result.succeeded.extend(outcome.succeeded);
            result.failed.extend(outcome.failed);
        }
        debug!(
            facet = %self.name(),
            ?kind,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "batch write finished"
        );
        result
    }

    async fn write_chunk(
        &self,
        chunk: usize,
        records: Vec<T>,
        kind: WriteKind,
        policy: BatchPolicy,
    ) -> BatchWriteResult<T> {
        let mut outcomes: Vec<Result<(), FacetError>> =
            vec![Err(FacetError::NotProcessed); records.len()];
        let mut pending: Vec<PendingWrite> = Vec::new();
        let mut by_key: HashMap<KeyId, usize> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            let request = match kind {
                WriteKind::Put => match self.to_item(record) {
                    Ok(item) => WriteRequest::put(item),
                    Err(e) => {
                        outcomes[i] = Err(e);
                        continue;
                    }
                },
                WriteKind::Delete => WriteRequest::delete(self.key_for(record)),
            };
            let id = (self.partition_key(record), self.sort_key(record));
            if let Some(&slot) = by_key.get(&id) {
                pending[slot].request = request;
                pending[slot].owners.push(i);
            } else {
                by_key.insert(id.clone(), pending.len());
                pending.push(PendingWrite {
                    id,
                    request,
                    owners: vec![i],
                });
            }
        }

        let results = self.send_writes(chunk, &pending, policy).await;
        for (write, result) in pending.iter().zip(results) {
            for &owner in &write.owners {
                outcomes[owner].clone_from(&result);
            }
        }

        let mut out = BatchWriteResult::default();
        for (record, outcome) in records.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => out.succeeded.push(record),
                Err(error) => out.failed.push(BatchFailure { record, error }),
            }
        }
        out
    }

    async fn send_writes(
        &self,
        chunk: usize,
        pending: &[PendingWrite],
        policy: BatchPolicy,
    ) -> Vec<Result<(), FacetError>> {
        let mut results: Vec<Result<(), FacetError>> =
            vec![Err(FacetError::NotProcessed); pending.len()];
        let mut outstanding: Vec<usize> = (0..pending.len()).collect();
        let mut attempt = 0;

        while !outstanding.is_empty() {
            let requests = outstanding
                .iter()
                .map(|&i| pending[i].request.clone())
                .collect();
            let input = BatchWriteItemInput {
                request_items: HashMap::from([(self.table_name().to_owned(), requests)]),
            };

            let mut output = match self.client().batch_write_item(input).await {
                Ok(output) => output,
                Err(error) => {
                    warn!(
                        facet = %self.name(),
                        chunk,
                        attempt,
                        records = outstanding.len(),
                        %error,
                        "batch write chunk failed"
                    );
                    let error = FacetError::Store(error);
                    for &i in &outstanding {
                        results[i] = Err(error.clone());
                    }
                    return results;
                }
            };

            let unprocessed: HashSet<KeyId> = output
                .unprocessed_items
                .remove(self.table_name())
                .unwrap_or_default()
                .iter()
                .filter_map(|request| request.target().and_then(key_id))
                .collect();
            outstanding.retain(|&i| {
                let done = !unprocessed.contains(&pending[i].id);
                if done {
                    results[i] = Ok(());
                }
                !done
            });

            if outstanding.is_empty() {
                break;
            }
            if attempt >= policy.max_retries {
                warn!(
                    facet = %self.name(),
                    chunk,
                    retries = attempt,
                    unprocessed = outstanding.len(),
                    "giving up on unprocessed writes"
                );
                break;
            }
            let delay = policy.delay_for(attempt);
            attempt += 1;
            debug!(
                facet = %self.name(),
                chunk,
                attempt,
                unprocessed = outstanding.len(),
                ?delay,
                "retrying unprocessed writes"
            );
            tokio::time::sleep(delay).await;
        }
        results
    }

    async fn get_chunk(
        &self,
        chunk: usize,
        records: Vec<T>,
        policy: BatchPolicy,
    ) -> BatchGetResult<T> {
        let mut pending: Vec<PendingGet> = Vec::new();
        let mut by_key: HashMap<KeyId, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            let id = (self.partition_key(record), self.sort_key(record));
            if let Some(&slot) = by_key.get(&id) {
                pending[slot].owners.push(i);
            } else {
                by_key.insert(id.clone(), pending.len());
                pending.push(PendingGet {
                    id,
                    key: self.key_for(record),
                    owners: vec![i],
                });
            }
        }

        let fetched = self.fetch_keys(chunk, &pending, policy).await;

        let mut inputs: Vec<Option<T>> = records.into_iter().map(Some).collect();
        let mut out = BatchGetResult::default();
        for (get, outcome) in pending.iter().zip(fetched) {
            match outcome.and_then(|item| item.map(|i| self.from_item(i)).transpose()) {
                Ok(Some(record)) => out.records.push(record),
                Ok(None) => {}
                Err(error) => {
                    for &owner in &get.owners {
                        if let Some(record) = inputs[owner].take() {
                            out.failed.push(BatchFailure {
                                record,
                                error: error.clone(),
                            });
                        }
                    }
                }
            }
        }
        out
    }

    async fn fetch_keys(
        &self,
        chunk: usize,
        pending: &[PendingGet],
        policy: BatchPolicy,
    ) -> Vec<Result<Option<Item>, FacetError>> {
        let mut results: Vec<Result<Option<Item>, FacetError>> =
            vec![Err(FacetError::NotProcessed); pending.len()];
        let mut outstanding: Vec<usize> = (0..pending.len()).collect();
        let mut attempt = 0;

        while !outstanding.is_empty() {
            let keys = KeysAndAttributes {
                keys: outstanding
                    .iter()
                    .map(|&i| pending[i].key.clone())
                    .collect(),
                consistent_read: self.config().consistent_read.then_some(true),
            };
            let input = BatchGetItemInput {
                request_items: HashMap::from([(self.table_name().to_owned(), keys)]),
            };

            let mut output = match self.client().batch_get_item(input).await {
                Ok(output) => output,
                Err(error) => {
                    warn!(
                        facet = %self.name(),
                        chunk,
                        attempt,
                        keys = outstanding.len(),
                        %error,
                        "batch get chunk failed"
                    );
                    let error = FacetError::Store(error);
                    for &i in &outstanding {
                        results[i] = Err(error.clone());
                    }
                    return results;
                }
            };

            let mut found: HashMap<KeyId, Item> = output
                .responses
                .remove(self.table_name())
                .unwrap_or_default()
                .into_iter()
                .filter_map(|item| key_id(&item).map(|id| (id, item)))
                .collect();
            let unprocessed: HashSet<KeyId> = output
                .unprocessed_keys
                .remove(self.table_name())
                .map(|k| k.keys)
                .unwrap_or_default()
                .iter()
                .filter_map(key_id)
                .collect();
            outstanding.retain(|&i| {
                let id = &pending[i].id;
                if let Some(item) = found.remove(id) {
                    results[i] = Ok(Some(item));
                    false
                } else if unprocessed.contains(id) {
                    true
                } else {
                    results[i] = Ok(None);
                    false
                }
            });

            if outstanding.is_empty() {
                break;
            }
            if attempt >= policy.max_retries {
                warn!(
                    facet = %self.name(),
                    chunk,
                    retries = attempt,
                    unprocessed = outstanding.len(),
                    "giving up on unprocessed keys"
                );
                break;
            }
            let delay = policy.delay_for(attempt);
            attempt += 1;
            debug!(
                facet = %self.name(),
                chunk,
                attempt,
                unprocessed = outstanding.len(),
                ?delay,
                "retrying unprocessed keys"
            );
            tokio::time::sleep(delay).await;
        }
        results
    }
}
