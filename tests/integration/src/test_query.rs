//! Partition queries, index queries and pagination.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use facet_core::{
        Condition, Facet, FacetConfig, FacetError, IndexDescriptor, IndexSlot, KeyConfiguration,
        QueryOptions, ShardConfiguration, SortKeyBound,
    };

    use crate::{Comment, MemoryStore, comment_keys, comments};

    async fn seeded() -> (Arc<MemoryStore>, Facet<Comment>) {
        let store = MemoryStore::new();
        let facet = comments(&store, FacetConfig::default()).unwrap();
        let authors = ["ann", "bob", "ann", "cat", "bob"];
        for (day, author) in authors.iter().enumerate() {
            let created = format!("2024-01-0{}", day + 1);
            facet
                .put(Comment::new("p1", &created, author))
                .await
                .result
                .unwrap();
        }
        facet
            .put(Comment::new("p2", "2024-01-01", "ann"))
            .await
            .result
            .unwrap();
        (store, facet)
    }

    /// Day of month of each record's creation date.
    fn days(records: &[Comment]) -> Vec<&str> {
        records
            .iter()
            .filter_map(|c| c.created.rsplit('-').next())
            .collect()
    }

    fn post(id: &str) -> Comment {
        Comment::new(id, "", "")
    }

    #[tokio::test]
    async fn test_should_list_partition_in_both_directions() {
        let (_, facet) = seeded().await;
        let page = facet
            .query(&post("p1"))
            .list(QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(days(&page.records), ["01", "02", "03", "04", "05"]);
        assert!(page.cursor.is_none());

        let options = QueryOptions::builder().scan_forward(false).build();
        let page = facet.query(&post("p1")).list(options).await.unwrap();
        assert_eq!(days(&page.records)[0], "05");
    }

    #[tokio::test]
    async fn test_should_paginate_with_cursor() {
        let (_, facet) = seeded().await;
        let query = facet.query(&post("p1"));

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            let options = QueryOptions {
                limit: Some(2),
                cursor: cursor.take(),
                ..QueryOptions::default()
            };
            let page = query.list(options).await.unwrap();
            pages += 1;
            seen.extend(page.records.into_iter().map(|c| c.created));
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[4], "2024-01-05");
    }

    #[tokio::test]
    async fn test_should_apply_sort_key_ranges() {
        let (_, facet) = seeded().await;
        let query = facet.query(&post("p1"));

        let page = query
            .between(
                SortKeyBound::Literal("COMMENT_2024-01-02"),
                SortKeyBound::Literal("COMMENT_2024-01-04"),
                QueryOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(days(&page.records), ["02", "03", "04"]);

        let pivot = Comment::new("p1", "2024-01-03", "");
        let after = query
            .greater_than(SortKeyBound::Record(&pivot), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(days(&after.records), ["04", "05"]);

        let upto = query
            .less_than_or_equal(SortKeyBound::Record(&pivot), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(upto.records.len(), 3);

        let exact = query
            .equals(SortKeyBound::Record(&pivot), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(exact.records[0].author, "ann");

        let month = query
            .begins_with(
                SortKeyBound::Literal("COMMENT_2024-01"),
                QueryOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(month.records.len(), 5);
    }

    #[tokio::test]
    async fn test_should_filter_results() {
        let (store, facet) = seeded().await;
        let options = QueryOptions::builder()
            .filter(Condition::eq("author", "bob").or(Condition::eq("author", "cat")))
            .build();
        let page = facet.query(&post("p1")).list(options).await.unwrap();
        assert_eq!(days(&page.records), ["02", "04", "05"]);

        let input = store.last_query().unwrap();
        assert_eq!(
            input.filter_expression.as_deref(),
            Some("(#filter_0 = :filter_0) OR (#filter_1 = :filter_1)")
        );
        assert_eq!(input.expression_attribute_names["#PK"], "PK");
    }

    #[tokio::test]
    async fn test_should_reject_unsupported_filter_before_query() {
        let (store, facet) = seeded().await;
        let options = QueryOptions::builder()
            .filter(Condition::exists("body"))
            .build();
        let err = facet.query(&post("p1")).list(options).await.unwrap_err();
        assert!(matches!(err, FacetError::UnsupportedOperator { .. }));
        assert!(store.last_query().is_none());
    }

    #[tokio::test]
    async fn test_should_return_first_record() {
        let (_, facet) = seeded().await;
        let first = facet
            .query(&post("p1"))
            .first(QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(first.unwrap().created, "2024-01-01");

        let none = facet
            .query(&post("p9"))
            .first(QueryOptions::default())
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_should_query_secondary_index() {
        let (store, facet) = seeded().await;
        let by_author = facet.index_by_alias("byAuthor").unwrap();
        let page = by_author
            .query(&Comment::new("", "", "ann"))
            .list(QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(page.records.len(), 3);
        assert!(page.records.iter().all(|c| c.author == "ann"));

        let input = store.last_query().unwrap();
        assert_eq!(input.index_name.as_deref(), Some("GSI1"));
        assert_eq!(input.expression_attribute_names["#PK"], "GSI1PK");
        assert_eq!(input.consistent_read, None);
    }

    #[tokio::test]
    async fn test_should_query_sharded_index_partition() {
        let store = MemoryStore::new();
        let (pk, sk) = comment_keys();
        let shard = ShardConfiguration::new(4).field("author", |c: &Comment| c.author.clone());
        let author = KeyConfiguration::new("AUTHOR")
            .field("author", |c: &Comment| c.author.clone())
            .sharded(shard);
        let created =
            KeyConfiguration::new("COMMENT").field("created", |c: &Comment| c.created.clone());
        let facet = Facet::new("Comment", "app-table", store.client(), pk, sk)
            .with_index(IndexDescriptor::new(IndexSlot::Gsi3, author, created))
            .unwrap();
        for day in 1..=3 {
            facet
                .put(Comment::new("p1", &format!("d{day}"), "dan"))
                .await
                .result
                .unwrap();
        }

        let index = facet.index(IndexSlot::Gsi3).unwrap();
        let sample = Comment::new("", "", "dan");
        let query = index.query(&sample);
        let page = query.list(QueryOptions::default()).await.unwrap();
        assert_eq!(page.records.len(), 3);

        let segments: Vec<&str> = query.partition().split('_').collect();
        let bucket: u32 = segments[1].parse().unwrap();
        let other = index.query_shard(&sample, (bucket + 1) % 4);
        let empty = other.list(QueryOptions::default()).await.unwrap();
        assert!(empty.records.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_garbled_cursor() {
        let (store, facet) = seeded().await;
        let options = QueryOptions::builder().cursor("not a cursor!").build();
        let err = facet.query(&post("p1")).list(options).await.unwrap_err();
        assert!(matches!(err, FacetError::Cursor(_)));
        assert!(store.last_query().is_none());
    }

    #[tokio::test]
    async fn test_should_request_consistent_reads_when_configured() {
        let store = MemoryStore::new();
        let config = FacetConfig::builder().consistent_read(true).build();
        let facet = comments(&store, config).unwrap();
        facet
            .query(&post("p1"))
            .list(QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(store.last_query().unwrap().consistent_read, Some(true));
    }
}
