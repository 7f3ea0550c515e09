//! Wire model for the key-value/wide-column store used by facet.
//!
//! These types mirror the store's JSON protocol: every item is a map of
//! attribute names to tagged [`AttributeValue`]s, and each of the six
//! operations facet issues (`GetItem`, `PutItem`, `DeleteItem`, `Query`,
//! `BatchGetItem`, `BatchWriteItem`) has an input and an output shape.
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use attribute_value::AttributeValue;
pub use error::{StoreError, StoreErrorCode};
pub use operations::StoreOperation;
pub use types::{Item, Key};
