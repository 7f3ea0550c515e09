//! Conversion between typed records and wire items.
//!
//! [`RecordCodec`] is the contract the rest of the crate depends on.
//! [`SerdeCodec`] implements it for any serde type by going through
//! [`serde_json::Value`], and the scalar helpers [`to_wire_value`] /
//! [`from_wire_value`] are shared with the expression compiler.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use facet_model::{AttributeValue, Item};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::{FacetError, FacetResult};

/// Converts records of type `T` to and from their wire attribute maps.
pub trait RecordCodec<T>: Send + Sync {
    /// Encode a record. Key and TTL attributes are added by the caller.
    fn to_wire(&self, record: &T) -> FacetResult<Item>;

    /// Decode a record from an item with key and TTL attributes removed.
    #[allow(clippy::wrong_self_convention)]
    fn from_wire(&self, item: Item) -> FacetResult<T>;
}

type Validator<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// A [`RecordCodec`] for any `Serialize + DeserializeOwned` type.
///
/// Records must serialize to a JSON object. Top-level `null` fields are left
/// out of the item. An optional validator runs on every decoded record.
pub struct SerdeCodec<T> {
    validator: Option<Validator<T>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    /// A codec without validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: None,
            _record: PhantomData,
        }
    }

    /// Run `validator` on every decoded record; an `Err` message becomes
    /// [`FacetError::Validation`].
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodec")
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl<T> RecordCodec<T> for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn to_wire(&self, record: &T) -> FacetResult<Item> {
        let value = serde_json::to_value(record).map_err(|e| FacetError::Codec(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(FacetError::Codec(
                "record must serialize to a map of fields".to_owned(),
            ));
        };
        Ok(fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), to_wire_value(v)))
            .collect())
    }

    fn from_wire(&self, item: Item) -> FacetResult<T> {
        let fields = item
            .iter()
            .map(|(k, v)| Ok((k.clone(), from_wire_value(v)?)))
            .collect::<FacetResult<Map<String, Value>>>()?;
        let record: T = serde_json::from_value(Value::Object(fields))
            .map_err(|e| FacetError::Codec(e.to_string()))?;
        if let Some(validator) = &self.validator {
            validator(&record).map_err(FacetError::Validation)?;
        }
        Ok(record)
    }
}

/// Convert a JSON value into its wire attribute.
#[must_use]
pub fn to_wire_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_wire_value).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_wire_value(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Convert a wire attribute back into a JSON value.
///
/// Binary values become standard base64 strings; sets become arrays.
pub fn from_wire_value(value: &AttributeValue) -> FacetResult<Value> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::B(b) => Value::String(STANDARD.encode(b)),
        AttributeValue::Ss(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(v) => Value::Array(
            v.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<FacetResult<_>>()?,
        ),
        AttributeValue::Bs(v) => Value::Array(
            v.iter()
                .map(|b| Value::String(STANDARD.encode(b)))
                .collect(),
        ),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(from_wire_value)
                .collect::<FacetResult<_>>()?,
        ),
        AttributeValue::M(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), from_wire_value(v)?)))
                .collect::<FacetResult<_>>()?,
        ),
    })
}

fn parse_number(text: &str) -> FacetResult<Number> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Ok(Number::from(u));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| FacetError::Codec(format!("'{text}' is not a number")))
}
