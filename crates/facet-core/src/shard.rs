//! Deterministic bucket assignment for hot partition keys.
//!
//! A key is hashed with CRC32 (IEEE) and reduced modulo the bucket count. The
//! bucket is rendered as lowercase hex, left-padded with zeros to the width
//! of `bucket_count - 1`, so every bucket of one configuration has the same
//! length and sorts the same way numerically and lexically.

/// Bucket for `key` among `bucket_count` buckets.
///
/// A `bucket_count` below 1 is treated as 1, so every key lands in `"0"`.
///
/// # Examples
///
/// ```
/// use facet_core::shard::shard;
///
/// assert_eq!(shard("abc", 4), shard("abc", 4));
/// assert_eq!(shard("abc", 0), "0");
/// ```
#[must_use]
pub fn shard(key: &str, bucket_count: u32) -> String {
    let buckets = bucket_count.max(1);
    format_bucket(crc32fast::hash(key.as_bytes()) % buckets, buckets)
}

/// Render an already-chosen bucket with the padding of `bucket_count`.
///
/// The bucket is not reduced; an out-of-range bucket is rendered as given.
#[must_use]
pub fn format_bucket(bucket: u32, bucket_count: u32) -> String {
    let width = shard_width(bucket_count);
    format!("{bucket:0width$x}")
}

/// Number of hex digits needed for the largest bucket of `bucket_count`.
#[must_use]
pub fn shard_width(bucket_count: u32) -> usize {
    let largest = bucket_count.max(1) - 1;
    let bits = u32::BITS - largest.leading_zeros();
    (bits.div_ceil(4) as usize).max(1)
}
