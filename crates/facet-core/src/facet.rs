//! The facet: one record type mapped onto the shared table.
//!
//! A [`Facet`] owns everything needed to move records of type `T` in and out
//! of the table: the primary key layout, the secondary index layouts, the
//! optional TTL, the record codec and the store client. Single-item reads and
//! writes live here; partition queries are in [`crate::query`] and bulk
//! operations in [`crate::batch`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use facet_model::input::{DeleteItemInput, GetItemInput, PutItemInput};
use facet_model::{AttributeValue, Item, Key};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::StoreClient;
use crate::codec::{RecordCodec, SerdeCodec};
use crate::config::FacetConfig;
use crate::error::{FacetError, FacetResult};
use crate::expression::{CONDITION_PREFIX, Condition, compile_condition};
use crate::index::{IndexDescriptor, IndexSlot};
use crate::key::KeyConfiguration;
use crate::query::PartitionQuery;

/// Primary partition key attribute.
pub const PARTITION_KEY: &str = "PK";

/// Primary sort key attribute.
pub const SORT_KEY: &str = "SK";

type TtlAccessor<T> = Arc<dyn Fn(&T) -> Option<DateTime<Utc>> + Send + Sync>;

/// Outcome of a single put or delete.
///
/// Expected failures, such as a rejected condition, are reported here rather
/// than returned as an `Err`.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    /// The record that was written or deleted.
    pub record: T,
    /// `Ok(())` when the store accepted the request.
    pub result: Result<(), FacetError>,
}

impl<T> WriteOutcome<T> {
    /// Returns `true` when the store accepted the request.
    #[must_use]
    pub fn was_successful(&self) -> bool {
        self.result.is_ok()
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&FacetError> {
        self.result.as_ref().err()
    }
}

/// A record type mapped onto the table.
pub struct Facet<T> {
    name: String,
    table_name: String,
    client: Arc<dyn StoreClient>,
    pk: KeyConfiguration<T>,
    sk: KeyConfiguration<T>,
    indexes: BTreeMap<IndexSlot, IndexDescriptor<T>>,
    ttl: Option<TtlAccessor<T>>,
    codec: Arc<dyn RecordCodec<T>>,
    config: FacetConfig,
}

impl<T> Facet<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// A facet that encodes records with [`SerdeCodec`] and the default
    /// configuration.
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        client: Arc<dyn StoreClient>,
        pk: KeyConfiguration<T>,
        sk: KeyConfiguration<T>,
    ) -> Self {
        Self::with_codec(name, table_name, client, pk, sk, SerdeCodec::new())
    }
}

impl<T> Facet<T> {
    /// A facet with a custom record codec.
    pub fn with_codec(
        name: impl Into<String>,
        table_name: impl Into<String>,
        client: Arc<dyn StoreClient>,
        pk: KeyConfiguration<T>,
        sk: KeyConfiguration<T>,
        codec: impl RecordCodec<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            client,
            pk,
            sk,
            indexes: BTreeMap::new(),
            ttl: None,
            codec: Arc::new(codec),
            config: FacetConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: FacetConfig) -> FacetResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Register a secondary index layout.
    ///
    /// Fails when the slot or the alias is already taken.
    pub fn with_index(mut self, descriptor: IndexDescriptor<T>) -> FacetResult<Self> {
        let slot = descriptor.slot();
        if self.indexes.contains_key(&slot) {
            return Err(FacetError::Config(format!(
                "index slot {slot} is configured twice on facet '{}'",
                self.name
            )));
        }
        if let Some(alias) = descriptor.alias() {
            if self.indexes.values().any(|d| d.alias() == Some(alias)) {
                return Err(FacetError::Config(format!(
                    "index alias '{alias}' is used twice on facet '{}'",
                    self.name
                )));
            }
        }
        self.indexes.insert(slot, descriptor);
        Ok(self)
    }

    /// Derive a TTL from each record. `None` writes no TTL attribute.
    #[must_use]
    pub fn with_ttl<F>(mut self, ttl: F) -> Self
    where
        F: Fn(&T) -> Option<DateTime<Utc>> + Send + Sync + 'static,
    {
        self.ttl = Some(Arc::new(ttl));
        self
    }

    /// The facet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table every operation targets.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FacetConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &dyn StoreClient {
        self.client.as_ref()
    }

    pub(crate) fn sort_key_config(&self) -> &KeyConfiguration<T> {
        &self.sk
    }

    /// Look up a configured index by slot.
    pub fn index(&self, slot: IndexSlot) -> FacetResult<IndexHandle<'_, T>> {
        self.indexes
            .get(&slot)
            .map(|descriptor| IndexHandle {
                facet: self,
                descriptor,
            })
            .ok_or_else(|| FacetError::NoSuchIndex {
                index: slot.name(),
            })
    }

    /// Look up a configured index by its alias.
    pub fn index_by_alias(&self, alias: &str) -> FacetResult<IndexHandle<'_, T>> {
        self.indexes
            .values()
            .find(|d| d.alias() == Some(alias))
            .map(|descriptor| IndexHandle {
                facet: self,
                descriptor,
            })
            .ok_or_else(|| FacetError::NoSuchIndex {
                index: alias.to_owned(),
            })
    }

    /// Configured index slots, in slot order.
    pub fn index_slots(&self) -> impl Iterator<Item = IndexSlot> + '_ {
        self.indexes.keys().copied()
    }

    /// Whether `name` is an attribute this layer writes itself.
    ///
    /// All twenty index slots are reserved whether or not this facet uses
    /// them, since other facets in the same table may.
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        name == PARTITION_KEY
            || name == SORT_KEY
            || name == self.config.ttl_attribute
            || name
                .strip_suffix("PK")
                .or_else(|| name.strip_suffix("SK"))
                .is_some_and(|slot| slot.parse::<IndexSlot>().is_ok_and(|s| s.name() == slot))
    }

    /// The partition key string for `record`.
    #[must_use]
    pub fn partition_key(&self, record: &T) -> String {
        self.pk.build_key(Some(record), &self.config.delimiter, None)
    }

    /// The sort key string for `record`.
    #[must_use]
    pub fn sort_key(&self, record: &T) -> String {
        self.sk.build_key(Some(record), &self.config.delimiter, None)
    }

    /// The `{PK, SK}` key of `record`.
    #[must_use]
    pub fn key_for(&self, record: &T) -> Key {
        Key::from([
            (PARTITION_KEY.to_owned(), AttributeValue::S(self.partition_key(record))),
            (SORT_KEY.to_owned(), AttributeValue::S(self.sort_key(record))),
        ])
    }

    /// Encode `record` into a full item: payload, primary key, index keys
    /// and TTL.
    pub fn to_item(&self, record: &T) -> FacetResult<Item> {
        let mut item = self.codec.to_wire(record)?;
        if let Some(name) = item.keys().find(|k| self.is_reserved(k)) {
            return Err(FacetError::ReservedAttribute { name: name.clone() });
        }

        item.extend(self.key_for(record));
        let delimiter = &self.config.delimiter;
        for (slot, descriptor) in &self.indexes {
            item.insert(
                slot.partition_attribute(),
                AttributeValue::S(descriptor.partition().build_key(Some(record), delimiter, None)),
            );
            item.insert(
                slot.sort_attribute(),
                AttributeValue::S(descriptor.sort().build_key(Some(record), delimiter, None)),
            );
        }
        if let Some(expires_at) = self.ttl.as_ref().and_then(|ttl| ttl(record)) {
            item.insert(
                self.config.ttl_attribute.clone(),
                AttributeValue::number(expires_at.timestamp()),
            );
        }
        Ok(item)
    }

    /// Decode an item read from the table, dropping every reserved attribute.
    pub fn from_item(&self, mut item: Item) -> FacetResult<T> {
        item.retain(|name, _| !self.is_reserved(name));
        self.codec.from_wire(item)
    }

    /// Write `record`, replacing any item with the same key.
    pub async fn put(&self, record: T) -> WriteOutcome<T> {
        let result = self.put_item(&record, None).await;
        WriteOutcome { record, result }
    }

    /// Write `record` only if `condition` holds for the stored item.
    pub async fn put_with_condition(&self, record: T, condition: &Condition) -> WriteOutcome<T> {
        let result = self.put_item(&record, Some(condition)).await;
        WriteOutcome { record, result }
    }

    /// Delete the item with `record`'s key.
    pub async fn delete(&self, record: T) -> WriteOutcome<T> {
        let result = self.delete_item(&record, None).await;
        WriteOutcome { record, result }
    }

    /// Delete the item with `record`'s key only if `condition` holds.
    pub async fn delete_with_condition(&self, record: T, condition: &Condition) -> WriteOutcome<T> {
        let result = self.delete_item(&record, Some(condition)).await;
        WriteOutcome { record, result }
    }

    /// Fetch the item with `record`'s key. `record` only needs its key
    /// fields set. A missing item is `Ok(None)`.
    pub async fn get(&self, record: &T) -> FacetResult<Option<T>> {
        let input = GetItemInput {
            table_name: self.table_name.clone(),
            key: self.key_for(record),
            consistent_read: self.config.consistent_read.then_some(true),
        };
        let output = self.client.get_item(input).await?;
        output.item.map(|item| self.from_item(item)).transpose()
    }

    /// Start a query on the partition `record` belongs to.
    #[must_use]
    pub fn query(&self, record: &T) -> PartitionQuery<'_, T> {
        let partition = self.pk.build_key(Some(record), &self.config.delimiter, None);
        PartitionQuery::new(self, None, partition)
    }

    /// Start a query on one explicit shard of `record`'s partition.
    ///
    /// `shard` selects the bucket directly; it is not hashed.
    #[must_use]
    pub fn query_shard(&self, record: &T, shard: u32) -> PartitionQuery<'_, T> {
        PartitionQuery::new(
            self,
            None,
            self.pk.build_key(Some(record), &self.config.delimiter, Some(shard)),
        )
    }

    async fn put_item(&self, record: &T, condition: Option<&Condition>) -> FacetResult<()> {
        let mut input = PutItemInput {
            table_name: self.table_name.clone(),
            item: self.to_item(record)?,
            ..PutItemInput::default()
        };
        if let Some(condition) = condition {
            let compiled = compile_condition(condition, CONDITION_PREFIX)?;
            input.condition_expression = Some(compiled.statement);
            input.expression_attribute_names = compiled.names;
            input.expression_attribute_values = compiled.values;
        }
        self.client.put_item(input).await?;
        debug!(facet = %self.name, conditional = condition.is_some(), "put item");
        Ok(())
    }

    async fn delete_item(&self, record: &T, condition: Option<&Condition>) -> FacetResult<()> {
        let mut input = DeleteItemInput {
            table_name: self.table_name.clone(),
            key: self.key_for(record),
            ..DeleteItemInput::default()
        };
        if let Some(condition) = condition {
            let compiled = compile_condition(condition, CONDITION_PREFIX)?;
            input.condition_expression = Some(compiled.statement);
            input.expression_attribute_names = compiled.names;
            input.expression_attribute_values = compiled.values;
        }
        self.client.delete_item(input).await?;
        debug!(facet = %self.name, conditional = condition.is_some(), "deleted item");
        Ok(())
    }
}

impl<T> fmt::Debug for Facet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facet")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("pk", &self.pk)
            .field("sk", &self.sk)
            .field("indexes", &self.indexes)
            .field("ttl", &self.ttl.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A configured secondary index of a facet.
pub struct IndexHandle<'a, T> {
    facet: &'a Facet<T>,
    descriptor: &'a IndexDescriptor<T>,
}

impl<'a, T> IndexHandle<'a, T> {
    /// The slot.
    #[must_use]
    pub fn slot(&self) -> IndexSlot {
        self.descriptor.slot()
    }

    /// The layout of this index.
    #[must_use]
    pub fn descriptor(&self) -> &'a IndexDescriptor<T> {
        self.descriptor
    }

    /// Start a query on the index partition `record` belongs to.
    #[must_use]
    pub fn query(&self, record: &T) -> PartitionQuery<'a, T> {
        let delimiter = &self.facet.config.delimiter;
        PartitionQuery::new(
            self.facet,
            Some(self.descriptor),
            self.descriptor
                .partition()
                .build_key(Some(record), delimiter, None),
        )
    }

    /// Start a query on one explicit shard of the index partition.
    #[must_use]
    pub fn query_shard(&self, record: &T, shard: u32) -> PartitionQuery<'a, T> {
        let delimiter = &self.facet.config.delimiter;
        PartitionQuery::new(
            self.facet,
            Some(self.descriptor),
            self.descriptor
                .partition()
                .build_key(Some(record), delimiter, Some(shard)),
        )
    }
}

impl<T> fmt::Debug for IndexHandle<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("facet", &self.facet.name)
            .field("slot", &self.descriptor.slot())
            .finish()
    }
}
