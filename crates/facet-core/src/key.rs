//! Composite key construction.
//!
//! A key is the configured prefix, an optional shard bucket, and the values
//! of the configured fields in order, joined with the facet delimiter:
//!
//! ```text
//! prefix [_ shard] [_ field1] [_ field2] ...
//! ```
//!
//! Field values are read through accessor closures supplied with the
//! configuration. A field whose value is [`KeyValue::Absent`] contributes no
//! segment at all, so two records that differ only in an absent field build
//! the same key.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::shard::{format_bucket, shard};

/// The value of one key field, as seen by the key builder.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// A string, used verbatim.
    Str(String),
    /// An integer.
    Integer(i128),
    /// A floating point number, rendered in positional notation. Very large
    /// or very small magnitudes are written out in full, never with an
    /// exponent (`1e21` becomes `1000000000000000000000`).
    Float(f64),
    /// A boolean, rendered `true` / `false`.
    Bool(bool),
    /// A point in time, rendered as ISO-8601 with milliseconds.
    Timestamp(DateTime<Utc>),
    /// No usable value. Contributes nothing to the key.
    Absent,
}

impl KeyValue {
    /// The key segment for this value, or `None` when it is absent.
    #[must_use]
    pub fn segment(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) if f.is_infinite() => Some(
                if f.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                }
                .to_owned(),
            ),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Absent => None,
        }
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for KeyValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(i128::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<usize> for KeyValue {
    fn from(value: usize) -> Self {
        Self::Integer(i128::try_from(value).unwrap_or(i128::MAX))
    }
}

impl<V: Into<KeyValue>> From<Option<V>> for KeyValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> KeyValue + Send + Sync>;

/// A named field of `T` that participates in a key.
pub struct KeyField<T> {
    name: String,
    accessor: Accessor<T>,
}

impl<T> KeyField<T> {
    /// A field read through `accessor`.
    pub fn new<V, F>(name: impl Into<String>, accessor: F) -> Self
    where
        V: Into<KeyValue>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accessor: Arc::new(move |record| accessor(record).into()),
        }
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the field from a record. A missing record reads as absent.
    #[must_use]
    pub fn read(&self, record: Option<&T>) -> KeyValue {
        record.map_or(KeyValue::Absent, |r| (self.accessor)(r))
    }
}

impl<T> Clone for KeyField<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for KeyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyField").field(&self.name).finish()
    }
}

/// Fields hashed together to pick a shard bucket.
pub struct ShardConfiguration<T> {
    fields: Vec<KeyField<T>>,
    bucket_count: u32,
}

impl<T> ShardConfiguration<T> {
    /// A configuration with `bucket_count` buckets and no fields yet.
    ///
    /// A count below 1 is treated as 1.
    #[must_use]
    pub fn new(bucket_count: u32) -> Self {
        Self {
            fields: Vec::new(),
            bucket_count: bucket_count.max(1),
        }
    }

    /// Add a field to the hash input.
    #[must_use]
    pub fn field<V, F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        V: Into<KeyValue>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.fields.push(KeyField::new(name, accessor));
        self
    }

    /// The number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// Hash the present field values, concatenated in order, into a bucket.
    #[must_use]
    pub fn bucket_for(&self, record: Option<&T>) -> String {
        let input: String = self
            .fields
            .iter()
            .filter_map(|f| f.read(record).segment())
            .collect();
        shard(&input, self.bucket_count)
    }
}

impl<T> Clone for ShardConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            bucket_count: self.bucket_count,
        }
    }
}

impl<T> fmt::Debug for ShardConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardConfiguration")
            .field("fields", &self.fields)
            .field("bucket_count", &self.bucket_count)
            .finish()
    }
}

/// How one key (partition or sort) is assembled from a record.
///
/// # Examples
///
/// ```
/// use facet_core::key::KeyConfiguration;
///
/// struct Post { author: String, slug: String }
///
/// let config = KeyConfiguration::new("POST")
///     .field("author", |p: &Post| p.author.clone())
///     .field("slug", |p: &Post| p.slug.clone());
/// let post = Post { author: "ann".into(), slug: "hello".into() };
/// assert_eq!(config.build_key(Some(&post), "_", None), "POST_ann_hello");
/// assert_eq!(config.build_key(None, "_", None), "POST");
/// ```
pub struct KeyConfiguration<T> {
    prefix: String,
    fields: Vec<KeyField<T>>,
    shard: Option<ShardConfiguration<T>>,
}

impl<T> KeyConfiguration<T> {
    /// A key that starts with `prefix` and has no fields yet.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fields: Vec::new(),
            shard: None,
        }
    }

    /// Append a field. Order of calls is the order of segments.
    #[must_use]
    pub fn field<V, F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        V: Into<KeyValue>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.fields.push(KeyField::new(name, accessor));
        self
    }

    /// Insert a shard bucket right after the prefix.
    #[must_use]
    pub fn sharded(mut self, shard: ShardConfiguration<T>) -> Self {
        self.shard = Some(shard);
        self
    }

    /// The key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The names of the key fields, in segment order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(KeyField::name)
    }

    /// The shard configuration, if any.
    #[must_use]
    pub fn shard(&self) -> Option<&ShardConfiguration<T>> {
        self.shard.as_ref()
    }

    /// Build the key string for `record`.
    ///
    /// `record` may be `None` to build the bare prefix (plus shard). When
    /// `explicit_shard` is `Some`, that bucket is used literally instead of
    /// hashing the shard fields; `Some(0)` selects bucket `"0"`. The explicit
    /// shard is ignored when the configuration has no shard.
    #[must_use]
    pub fn build_key(
        &self,
        record: Option<&T>,
        delimiter: &str,
        explicit_shard: Option<u32>,
    ) -> String {
        let mut segments = vec![self.prefix.clone()];

        if let Some(shard) = &self.shard {
            segments.push(match explicit_shard {
                Some(bucket) => format_bucket(bucket, shard.bucket_count),
                None => shard.bucket_for(record),
            });
        }

        segments.extend(self.fields.iter().filter_map(|f| f.read(record).segment()));
        segments.join(delimiter)
    }
}

impl<T> Clone for KeyConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            fields: self.fields.clone(),
            shard: self.shard.clone(),
        }
    }
}

impl<T> fmt::Debug for KeyConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfiguration")
            .field("prefix", &self.prefix)
            .field("fields", &self.fields)
            .field("shard", &self.shard)
            .finish()
    }
}
