//! Batch writes and gets: chunking, retries and partial failure.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use facet_core::{
        BatchPolicy, Facet, FacetConfig, FacetError, FacetResult, RecordCodec, SerdeCodec,
    };
    use facet_model::{Item, StoreOperation};

    use crate::{Comment, MemoryStore, comment_keys, comments};

    fn fast_policy(batch_size: usize, max_retries: u32) -> BatchPolicy {
        BatchPolicy::builder()
            .batch_size(batch_size)
            .max_retries(max_retries)
            .base_delay_ms(1)
            .max_delay_ms(5)
            .build()
    }

    fn facet_with(
        store: &Arc<MemoryStore>,
        write: BatchPolicy,
        get: BatchPolicy,
    ) -> Facet<Comment> {
        let config = FacetConfig::builder().write(write).get(get).build();
        comments(store, config).unwrap()
    }

    fn numbered(count: usize) -> Vec<Comment> {
        (0..count)
            .map(|i| Comment::new("p1", &format!("{i:03}"), "ann"))
            .collect()
    }

    #[tokio::test]
    async fn test_should_chunk_writes_at_store_ceiling() {
        let store = MemoryStore::new();
        let facet = comments(&store, FacetConfig::default()).unwrap();

        let result = facet.put_many(numbered(60)).await;
        assert!(!result.has_failures());
        assert_eq!(result.succeeded.len(), 60);
        assert_eq!(store.batch_write_sizes(), [10, 25, 25]);
        assert_eq!(store.len(), 60);
    }

    #[tokio::test]
    async fn test_should_clamp_oversized_batch_size() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(500, 0), BatchPolicy::gets());
        facet.put_many(numbered(30)).await;
        assert_eq!(store.batch_write_sizes(), [5, 25]);
    }

    #[tokio::test]
    async fn test_should_retry_unprocessed_writes() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(25, 5), BatchPolicy::gets());
        store.script_unprocessed_writes([3, 0]);

        let result = facet.put_many(numbered(10)).await;
        assert!(!result.has_failures());
        assert_eq!(result.succeeded.len(), 10);
        assert_eq!(store.calls(StoreOperation::BatchWriteItem), 2);
        assert_eq!(store.batch_write_sizes(), [3, 10]);
        assert_eq!(store.len(), 10);
    }

    #[tokio::test]
    async fn test_should_fail_records_left_after_retries() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(25, 2), BatchPolicy::gets());
        store.script_unprocessed_writes([2, 2, 2]);

        let result = facet.put_many(numbered(10)).await;
        assert_eq!(store.calls(StoreOperation::BatchWriteItem), 3);
        assert_eq!(result.succeeded.len(), 8);
        assert_eq!(result.failed.len(), 2);
        assert!(
            result
                .failed
                .iter()
                .all(|f| matches!(f.error, FacetError::NotProcessed))
        );
        assert_eq!(store.len(), 8);
    }

    #[tokio::test]
    async fn test_should_collapse_duplicate_keys_to_last_write() {
        let store = MemoryStore::new();
        let facet = comments(&store, FacetConfig::default()).unwrap();
        let first = Comment::new("p1", "t1", "ann");
        let mut second = first.clone();
        second.body = "second".to_owned();

        let result = facet.put_many(vec![first, second]).await;
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(store.batch_write_sizes(), [1]);
        let stored = store.item("POST_p1", "COMMENT_t1").unwrap();
        assert_eq!(stored["body"].as_s(), Some("second"));
    }

    #[tokio::test]
    async fn test_should_isolate_failing_chunk() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(10, 1), BatchPolicy::gets());
        let mut records = numbered(30);
        records[15].post_id = "broken".to_owned();
        store.fail_partition("POST_broken");

        let result = facet.put_many(records).await;
        assert_eq!(result.succeeded.len(), 20);
        assert_eq!(result.failed.len(), 10);
        assert!(
            result
                .failed
                .iter()
                .all(|f| matches!(f.error, FacetError::Store(_)))
        );
        let failed: Vec<&str> = result
            .failed
            .iter()
            .map(|f| f.record.created.as_str())
            .collect();
        assert!(failed.contains(&"010") && failed.contains(&"019"));
        assert_eq!(store.len(), 20);
    }

    struct NonEmptyBody(SerdeCodec<Comment>);

    impl RecordCodec<Comment> for NonEmptyBody {
        fn to_wire(&self, record: &Comment) -> FacetResult<Item> {
            if record.body.is_empty() {
                return Err(FacetError::Codec("empty body".to_owned()));
            }
            self.0.to_wire(record)
        }

        fn from_wire(&self, item: Item) -> FacetResult<Comment> {
            self.0.from_wire(item)
        }
    }

    #[tokio::test]
    async fn test_should_fail_only_records_that_do_not_encode() {
        let store = MemoryStore::new();
        let (pk, sk) = comment_keys();
        let facet = Facet::with_codec(
            "Comment",
            "app-table",
            store.client(),
            pk,
            sk,
            NonEmptyBody(SerdeCodec::new()),
        );
        let mut records = numbered(5);
        records[2].body.clear();

        let result = facet.put_many(records).await;
        assert_eq!(result.succeeded.len(), 4);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].record.created, "002");
        assert!(matches!(result.failed[0].error, FacetError::Codec(_)));
        assert_eq!(store.batch_write_sizes(), [4]);
    }

    #[tokio::test]
    async fn test_should_delete_many() {
        let store = MemoryStore::new();
        let facet = comments(&store, FacetConfig::default()).unwrap();
        facet.put_many(numbered(40)).await;

        let result = facet.delete_many(numbered(40)).await;
        assert_eq!(result.succeeded.len(), 40);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_retry_unprocessed_deletes() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(25, 5), BatchPolicy::gets());
        facet.put_many(numbered(10)).await;
        assert_eq!(store.calls(StoreOperation::BatchWriteItem), 1);
        store.script_unprocessed_writes([3, 0]);

        let result = facet.delete_many(numbered(10)).await;
        assert!(!result.has_failures());
        assert_eq!(result.succeeded.len(), 10);
        assert_eq!(store.calls(StoreOperation::BatchWriteItem), 3);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_fail_deletes_left_after_retries() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(25, 1), BatchPolicy::gets());
        facet.put_many(numbered(10)).await;
        store.script_unprocessed_writes([2, 2]);

        let result = facet.delete_many(numbered(10)).await;
        assert_eq!(result.succeeded.len() + result.failed.len(), 10);
        assert_eq!(result.succeeded.len(), 8);
        assert_eq!(result.failed.len(), 2);
        assert!(
            result
                .failed
                .iter()
                .all(|f| matches!(f.error, FacetError::NotProcessed))
        );
        assert_eq!(store.len(), 2);
        assert!(store.item("POST_p1", "COMMENT_009").is_some());
    }

    #[tokio::test]
    async fn test_should_keep_partial_progress_when_retry_fails() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, fast_policy(25, 3), BatchPolicy::gets());
        store.script_unprocessed_writes([3]);
        store.script_write_faults([false, true]);

        let result = facet.put_many(numbered(10)).await;
        assert_eq!(store.calls(StoreOperation::BatchWriteItem), 2);
        assert_eq!(result.succeeded.len(), 7);
        assert_eq!(result.failed.len(), 3);
        assert!(
            result
                .failed
                .iter()
                .all(|f| matches!(f.error, FacetError::Store(_)))
        );
        let mut failed: Vec<&str> = result
            .failed
            .iter()
            .map(|f| f.record.created.as_str())
            .collect();
        failed.sort_unstable();
        assert_eq!(failed, ["007", "008", "009"]);
        assert_eq!(store.len(), 7);
    }

    #[tokio::test]
    async fn test_should_get_many_skipping_missing_and_duplicate_keys() {
        let store = MemoryStore::new();
        let facet = comments(&store, FacetConfig::default()).unwrap();
        facet.put_many(numbered(3)).await;

        let lookups = vec![
            Comment::new("p1", "000", ""),
            Comment::new("p1", "002", ""),
            Comment::new("p1", "999", ""),
            Comment::new("p1", "000", ""),
        ];
        let result = facet.get_many(lookups).await;
        assert!(!result.has_failures());
        let mut found: Vec<String> = result.records.into_iter().map(|c| c.created).collect();
        found.sort();
        assert_eq!(found, ["000", "002"]);
        assert_eq!(store.calls(StoreOperation::BatchGetItem), 1);
    }

    #[tokio::test]
    async fn test_should_retry_unprocessed_keys() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, BatchPolicy::writes(), fast_policy(100, 3));
        facet.put_many(numbered(150)).await;
        store.script_unprocessed_gets([7, 0, 0]);

        let result = facet.get_many(numbered(150)).await;
        assert!(!result.has_failures());
        assert_eq!(result.records.len(), 150);
        assert_eq!(store.calls(StoreOperation::BatchGetItem), 3);
    }

    #[tokio::test]
    async fn test_should_fail_keys_left_after_retries() {
        let store = MemoryStore::new();
        let facet = facet_with(&store, BatchPolicy::writes(), fast_policy(100, 1));
        facet.put_many(numbered(4)).await;
        store.script_unprocessed_gets([1, 1]);

        let result = facet.get_many(numbered(4)).await;
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.failed.len(), 1);
        assert!(matches!(result.failed[0].error, FacetError::NotProcessed));
        assert_eq!(result.failed[0].record.created, "003");
    }

    #[tokio::test]
    async fn test_should_report_records_failing_validation_on_get() {
        let store = MemoryStore::new();
        let (pk, sk) = comment_keys();
        let writer = comments(&store, FacetConfig::default()).unwrap();
        writer.put_many(numbered(3)).await;
        let mut banned = Comment::new("p1", "100", "mallory");
        banned.votes = -1;
        writer.put(banned).await.result.unwrap();

        let reader = Facet::with_codec(
            "Comment",
            "app-table",
            store.client(),
            pk,
            sk,
            SerdeCodec::new().with_validator(|c: &Comment| {
                if c.votes < 0 {
                    Err("negative votes".to_owned())
                } else {
                    Ok(())
                }
            }),
        );
        let mut lookups = numbered(3);
        lookups.push(Comment::new("p1", "100", ""));

        let result = reader.get_many(lookups).await;
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.failed.len(), 1);
        assert!(matches!(result.failed[0].error, FacetError::Validation(_)));
    }
}
