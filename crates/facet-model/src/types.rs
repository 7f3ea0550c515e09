//! Shared request shapes and item aliases.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;

/// A stored item: attribute names to values.
pub type Item = HashMap<String, AttributeValue>;

/// A primary key: the partition and sort attributes of an item.
pub type Key = HashMap<String, AttributeValue>;

/// Placeholder (`#name`) to attribute name substitutions.
pub type ExpressionAttributeNames = HashMap<String, String>;

/// Placeholder (`:value`) to value substitutions.
pub type ExpressionAttributeValues = HashMap<String, AttributeValue>;

/// The keys to fetch from one table in a `BatchGetItem` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeysAndAttributes {
    /// The primary keys of the items to retrieve.
    pub keys: Vec<Key>,
    /// Whether to use a strongly consistent read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// One put or delete inside a `BatchWriteItem` call.
///
/// Exactly one of the two requests is set; use the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    /// Put an item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_request: Option<PutRequest>,
    /// Delete an item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_request: Option<DeleteRequest>,
}

impl WriteRequest {
    /// A put of the full item.
    #[must_use]
    pub fn put(item: Item) -> Self {
        Self {
            put_request: Some(PutRequest { item }),
            delete_request: None,
        }
    }

    /// A delete by primary key.
    #[must_use]
    pub fn delete(key: Key) -> Self {
        Self {
            put_request: None,
            delete_request: Some(DeleteRequest { key }),
        }
    }

    /// The attributes that identify the target item.
    ///
    /// For a put this is the whole item, which contains the key attributes.
    #[must_use]
    pub fn target(&self) -> Option<&HashMap<String, AttributeValue>> {
        self.put_request
            .as_ref()
            .map(|p| &p.item)
            .or_else(|| self.delete_request.as_ref().map(|d| &d.key))
    }
}

/// The item body of a batched put.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// The item attributes to put.
    pub item: Item,
}

/// The key of a batched delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    /// The primary key of the item to delete.
    pub key: Key,
}
