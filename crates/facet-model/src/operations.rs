//! The store operations the data-access layer issues.

use std::fmt;

/// Every request kind sent through a store client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Put (insert or replace) one item.
    PutItem,
    /// Get one item by primary key.
    GetItem,
    /// Delete one item by primary key.
    DeleteItem,
    /// Read items from a single partition.
    Query,
    /// Fetch many items by key.
    BatchGetItem,
    /// Put or delete many items.
    BatchWriteItem,
}

impl StoreOperation {
    /// All operations, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PutItem,
        Self::GetItem,
        Self::DeleteItem,
        Self::Query,
        Self::BatchGetItem,
        Self::BatchWriteItem,
    ];

    /// Returns the wire operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PutItem => "PutItem",
            Self::GetItem => "GetItem",
            Self::DeleteItem => "DeleteItem",
            Self::Query => "Query",
            Self::BatchGetItem => "BatchGetItem",
            Self::BatchWriteItem => "BatchWriteItem",
        }
    }

    /// Parse a wire operation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
