//! Single-partition range queries.
//!
//! A [`PartitionQuery`] is bound to one partition key value, on the primary
//! key or on a secondary index. Each operation builds a key condition on the
//! sort key, optionally attaches a compiled filter, resumes from a cursor,
//! fetches exactly one page and decodes it.

use std::fmt;

use facet_model::{AttributeValue, Key};
use facet_model::input::QueryInput;
use facet_model::types::{ExpressionAttributeNames, ExpressionAttributeValues};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::FacetResult;
use crate::expression::{CompareOp, Condition, FILTER_PREFIX, compile_filter};
use crate::facet::{Facet, PARTITION_KEY, SORT_KEY};
use crate::index::IndexDescriptor;
use crate::key::KeyConfiguration;

/// Per-call query settings.
///
/// # Examples
///
/// ```
/// use facet_core::query::QueryOptions;
///
/// let options = QueryOptions::builder().limit(10).scan_forward(false).build();
/// assert_eq!(options.limit, Some(10));
/// assert!(options.cursor.is_none());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct QueryOptions {
    /// Maximum number of items the store evaluates for this page.
    #[builder(default, setter(strip_option))]
    pub limit: Option<u32>,

    /// Cursor from a previous page.
    #[builder(default, setter(strip_option, into))]
    pub cursor: Option<String>,

    /// Ascending sort-key order when `true`.
    #[builder(default = true)]
    pub scan_forward: bool,

    /// Filter applied by the store after the key condition.
    #[builder(default, setter(strip_option))]
    pub filter: Option<Condition>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: None,
            cursor: None,
            scan_forward: true,
            filter: None,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct QueryPage<T> {
    /// Decoded records, in sort-key order.
    pub records: Vec<T>,
    /// Present when more results may exist; pass it back to continue.
    pub cursor: Option<String>,
}

/// A sort-key bound: built from a record or given verbatim.
#[derive(Debug)]
pub enum SortKeyBound<'b, T> {
    /// Build the bound with the sort key configuration.
    Record(&'b T),
    /// Use this exact sort key string.
    Literal(&'b str),
}

impl<T> Clone for SortKeyBound<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SortKeyBound<'_, T> {}

#[derive(Debug)]
enum SortCondition {
    Compare(CompareOp, String),
    Between(String, String),
    BeginsWith(String),
}

/// A query against one partition.
pub struct PartitionQuery<'a, T> {
    facet: &'a Facet<T>,
    index: Option<&'a IndexDescriptor<T>>,
    partition: String,
}

impl<'a, T> PartitionQuery<'a, T> {
    pub(crate) fn new(
        facet: &'a Facet<T>,
        index: Option<&'a IndexDescriptor<T>>,
        partition: String,
    ) -> Self {
        Self {
            facet,
            index,
            partition,
        }
    }

    /// The partition key value this query is bound to.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Records whose sort key equals the bound.
    pub async fn equals(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.compare(CompareOp::Eq, bound, options).await
    }

    /// Records whose sort key is greater than the bound.
    pub async fn greater_than(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.compare(CompareOp::Gt, bound, options).await
    }

    /// Records whose sort key is greater than or equal to the bound.
    pub async fn greater_than_or_equal(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.compare(CompareOp::Ge, bound, options).await
    }

    /// Records whose sort key is less than the bound.
    pub async fn less_than(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.compare(CompareOp::Lt, bound, options).await
    }

    /// Records whose sort key is less than or equal to the bound.
    pub async fn less_than_or_equal(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.compare(CompareOp::Le, bound, options).await
    }

    /// Records whose sort key lies between `start` and `end`, inclusive.
    pub async fn between(
        &self,
        start: SortKeyBound<'_, T>,
        end: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        let condition = SortCondition::Between(self.resolve(start), self.resolve(end));
        self.execute(condition, options).await
    }

    /// Records whose sort key starts with the bound.
    pub async fn begins_with(
        &self,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.execute(SortCondition::BeginsWith(self.resolve(bound)), options)
            .await
    }

    /// Every record under the sort key prefix of this facet.
    pub async fn list(&self, options: QueryOptions) -> FacetResult<QueryPage<T>> {
        let prefix = self
            .sort_config()
            .build_key(None, &self.facet.config().delimiter, None);
        self.execute(SortCondition::BeginsWith(prefix), options).await
    }

    /// The first record under the sort key prefix, if any.
    ///
    /// The page size is forced to 1, so with a filter the first item read may
    /// be filtered out and `None` returned even though later items match.
    pub async fn first(&self, options: QueryOptions) -> FacetResult<Option<T>> {
        let options = QueryOptions {
            limit: Some(1),
            ..options
        };
        let page = self.list(options).await?;
        Ok(page.records.into_iter().next())
    }

    async fn compare(
        &self,
        op: CompareOp,
        bound: SortKeyBound<'_, T>,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        self.execute(SortCondition::Compare(op, self.resolve(bound)), options)
            .await
    }

    fn sort_config(&self) -> &KeyConfiguration<T> {
        self.index
            .map_or_else(|| self.facet.sort_key_config(), |d| d.sort())
    }

    fn resolve(&self, bound: SortKeyBound<'_, T>) -> String {
        match bound {
            SortKeyBound::Record(record) => {
                self.sort_config()
                    .build_key(Some(record), &self.facet.config().delimiter, None)
            }
            SortKeyBound::Literal(key) => key.to_owned(),
        }
    }

    fn key_attributes(&self) -> (String, String) {
        match self.index {
            Some(d) => (d.slot().partition_attribute(), d.slot().sort_attribute()),
            None => (PARTITION_KEY.to_owned(), SORT_KEY.to_owned()),
        }
    }

    fn build_input(
        &self,
        condition: &SortCondition,
        options: &QueryOptions,
    ) -> FacetResult<QueryInput> {
        let (pk_attr, sk_attr) = self.key_attributes();
        let mut names = ExpressionAttributeNames::from([
            ("#PK".to_owned(), pk_attr),
            ("#SK".to_owned(), sk_attr),
        ]);
        let mut values = ExpressionAttributeValues::from([(
            ":PK".to_owned(),
            AttributeValue::S(self.partition.clone()),
        )]);

        let sort_clause = match condition {
            SortCondition::Compare(op, key) => {
                values.insert(":SK".to_owned(), AttributeValue::S(key.clone()));
                format!("#SK {op} :SK")
            }
            SortCondition::Between(start, end) => {
                values.insert(":SK_start".to_owned(), AttributeValue::S(start.clone()));
                values.insert(":SK_end".to_owned(), AttributeValue::S(end.clone()));
                "#SK BETWEEN :SK_start AND :SK_end".to_owned()
            }
            SortCondition::BeginsWith(prefix) => {
                values.insert(":SK".to_owned(), AttributeValue::S(prefix.clone()));
                "begins_with(#SK, :SK)".to_owned()
            }
        };

        let filter_expression = match &options.filter {
            Some(filter) => {
                let compiled = compile_filter(filter, FILTER_PREFIX)?;
                names.extend(compiled.names);
                values.extend(compiled.values);
                Some(compiled.statement)
            }
            None => None,
        };

        let exclusive_start_key = match options.cursor.as_deref() {
            Some(cursor) => decode_cursor(cursor)?.unwrap_or_default(),
            None => Key::default(),
        };

        Ok(QueryInput {
            table_name: self.facet.table_name().to_owned(),
            index_name: self.index.map(|d| d.slot().name()),
            key_condition_expression: Some(format!("#PK = :PK AND {sort_clause}")),
            filter_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            scan_index_forward: Some(options.scan_forward),
            limit: options.limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX)),
            exclusive_start_key,
            consistent_read: (self.index.is_none() && self.facet.config().consistent_read)
                .then_some(true),
        })
    }

    async fn execute(
        &self,
        condition: SortCondition,
        options: QueryOptions,
    ) -> FacetResult<QueryPage<T>> {
        let input = self.build_input(&condition, &options)?;
        debug!(
            facet = %self.facet.name(),
            index = ?input.index_name,
            partition = %self.partition,
            condition = ?condition,
            "executing query"
        );

        let output = self.facet.client().query(input).await?;
        let records = output
            .items
            .into_iter()
            .map(|item| self.facet.from_item(item))
            .collect::<FacetResult<Vec<_>>>()?;
        let cursor = if output.last_evaluated_key.is_empty() {
            None
        } else {
            Some(encode_cursor(&output.last_evaluated_key)?)
        };

        debug!(
            facet = %self.facet.name(),
            count = records.len(),
            more = cursor.is_some(),
            "query page fetched"
        );
        Ok(QueryPage { records, cursor })
    }
}

impl<T> fmt::Debug for PartitionQuery<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionQuery")
            .field("facet", &self.facet.name())
            .field("index", &self.index.map(IndexDescriptor::slot))
            .field("partition", &self.partition)
            .finish()
    }
}
