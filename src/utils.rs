//! Metadata helpers.
//!
//! `public_meta`, `private_meta` and `data` fields are raw bytes. These
//! helpers store JSON in them:
//!
//! ```ignore
//! let meta = serialize_object(&json!({ "name": "report.pdf" }))?;
//! let back: serde_json::Value = deserialize_object(&file.public_meta)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

// ============================================================================
// Helpers
// ============================================================================

/// Encodes `value` as UTF-8 JSON bytes.
pub fn serialize_object<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes UTF-8 JSON bytes.
///
/// Empty input decodes as an empty object.
pub fn deserialize_object<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    if data.is_empty() {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(data)?)
}

// ============================================================================
// Tests
// ============================================================================
