//! Facet configuration.
//!
//! Provides [`FacetConfig`] (key delimiter, TTL attribute, read consistency)
//! and the per-operation [`BatchPolicy`] used by the batch engine. Values can
//! be loaded from environment variables via [`FacetConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{FacetError, FacetResult};

/// Largest number of puts/deletes the store accepts in one batch request.
pub const MAX_WRITE_BATCH: usize = 25;

/// Largest number of keys the store accepts in one batch get request.
pub const MAX_GET_BATCH: usize = 100;

/// Chunking and retry settings for one kind of batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BatchPolicy {
    /// Records per request. Clamped to `[1, store ceiling]` when used.
    pub batch_size: usize,

    /// Retries of unprocessed items after the initial request.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on every further retry.
    #[builder(default = 100)]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    #[builder(default = 10_000)]
    pub max_delay_ms: u64,
}

impl BatchPolicy {
    /// Defaults for batch writes: 25 per request, 5 retries.
    #[must_use]
    pub fn writes() -> Self {
        Self {
            batch_size: MAX_WRITE_BATCH,
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
        }
    }

    /// Defaults for batch gets: 100 per request, 10 retries.
    #[must_use]
    pub fn gets() -> Self {
        Self {
            batch_size: MAX_GET_BATCH,
            max_retries: 10,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
        }
    }

    /// The chunk size to use against a store that accepts at most `ceiling`.
    #[must_use]
    pub fn chunk_size(&self, ceiling: usize) -> usize {
        self.batch_size.clamp(1, ceiling.max(1))
    }

    /// Backoff before retry number `attempt` (zero based): `base * 2^attempt`,
    /// capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// Facet configuration.
///
/// # Examples
///
/// ```
/// use facet_core::config::FacetConfig;
///
/// let config = FacetConfig::default();
/// assert_eq!(config.delimiter, "_");
/// assert_eq!(config.write.batch_size, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct FacetConfig {
    /// Separator placed between composite key segments.
    #[builder(default = String::from("_"), setter(into))]
    pub delimiter: String,

    /// Name of the numeric TTL attribute (epoch seconds).
    #[builder(default = String::from("TTL"), setter(into))]
    pub ttl_attribute: String,

    /// Policy for `put_many` / `delete_many`.
    #[builder(default = BatchPolicy::writes())]
    pub write: BatchPolicy,

    /// Policy for `get_many`.
    #[builder(default = BatchPolicy::gets())]
    pub get: BatchPolicy,

    /// Use strongly consistent reads on the primary key.
    #[builder(default = false)]
    pub consistent_read: bool,
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            delimiter: String::from("_"),
            ttl_attribute: String::from("TTL"),
            write: BatchPolicy::writes(),
            get: BatchPolicy::gets(),
            consistent_read: false,
        }
    }
}

impl FacetConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FACET_DELIMITER` | `_` |
    /// | `FACET_TTL_ATTRIBUTE` | `TTL` |
    /// | `FACET_CONSISTENT_READ` | `false` |
    /// | `FACET_WRITE_MAX_RETRIES` | `5` |
    /// | `FACET_GET_MAX_RETRIES` | `10` |
    /// | `FACET_BATCH_BASE_DELAY_MS` | `100` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FacetConfig::from_env`], reading values through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("FACET_DELIMITER") {
            config.delimiter = v;
        }
        if let Some(v) = lookup("FACET_TTL_ATTRIBUTE") {
            config.ttl_attribute = v;
        }
        if let Some(v) = lookup("FACET_CONSISTENT_READ") {
            config.consistent_read = parse_bool(&v);
        }
        if let Some(n) = lookup("FACET_WRITE_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            config.write.max_retries = n;
        }
        if let Some(n) = lookup("FACET_GET_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            config.get.max_retries = n;
        }
        if let Some(n) = lookup("FACET_BATCH_BASE_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.write.base_delay_ms = n;
            config.get.base_delay_ms = n;
        }

        config
    }

    /// Reject settings that would produce unreadable keys or clobber key
    /// attributes.
    pub fn validate(&self) -> FacetResult<()> {
        if self.delimiter.is_empty() {
            return Err(FacetError::Config("delimiter must not be empty".to_owned()));
        }
        if self.ttl_attribute.is_empty() {
            return Err(FacetError::Config(
                "ttl attribute name must not be empty".to_owned(),
            ));
        }
        if matches!(self.ttl_attribute.as_str(), "PK" | "SK") {
            return Err(FacetError::Config(format!(
                "ttl attribute '{}' collides with a primary key attribute",
                self.ttl_attribute
            )));
        }
        Ok(())
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
