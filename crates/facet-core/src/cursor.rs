//! Opaque pagination cursors.
//!
//! A cursor is the store's last-evaluated key, serialized as CBOR and then
//! encoded as URL-safe base64 without padding, so it can travel in a query
//! string untouched.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use facet_model::Key;

use crate::error::{FacetError, FacetResult};

/// Encode a resume key into a cursor string.
pub fn encode_cursor(key: &Key) -> FacetResult<String> {
    let mut buf = Vec::new();
    ciborium::into_writer(key, &mut buf).map_err(|e| FacetError::Cursor(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Decode a cursor string. An empty cursor means "start of partition".
pub fn decode_cursor(cursor: &str) -> FacetResult<Option<Key>> {
    if cursor.is_empty() {
        return Ok(None);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|e| FacetError::Cursor(e.to_string()))?;
    let key: Key =
        ciborium::from_reader(bytes.as_slice()).map_err(|e| FacetError::Cursor(e.to_string()))?;
    Ok(Some(key))
}
