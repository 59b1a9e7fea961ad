//! Per-participant layer snapshot document.
//!
//! Each participant owns exactly one document in the session's drawing
//! collection, keyed by their id, holding the full raster of their layer:
//! `{ imageData: "data:image/png;base64,...", updatedAt: <server time> }`.
//! Snapshots replace each other wholesale; there is no stroke log.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::RecordError;
use crate::timestamp::server_timestamp;

/// Field holding the encoded raster.
pub const IMAGE_DATA: &str = "imageData";

/// Field holding the commit time in milliseconds.
pub const UPDATED_AT: &str = "updatedAt";

/// A participant's persisted layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    /// Data-URI encoded PNG of the whole layer.
    #[serde(default)]
    pub image_data: String,
    /// Commit time in epoch milliseconds; `None` while a write is pending.
    #[serde(default, deserialize_with = "millis_or_none")]
    pub updated_at: Option<i64>,
}

impl LayerRecord {
    #[must_use]
    pub fn new(image_data: String) -> Self {
        Self { image_data, updated_at: None }
    }

    /// Fields for a merge-write: the image plus a server-timestamp sentinel.
    ///
    /// Only these two fields are written so unrelated fields on the document
    /// survive the merge.
    #[must_use]
    pub fn to_write_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(IMAGE_DATA.to_owned(), Value::String(self.image_data.clone()));
        fields.insert(UPDATED_AT.to_owned(), server_timestamp());
        fields
    }

    /// Parse a stored document body.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Json`] when the body is not an object of the
    /// expected shape and [`RecordError::MissingField`] when `imageData` is
    /// absent or blank.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let record = Self::deserialize(value)?;
        if record.image_data.trim().is_empty() {
            return Err(RecordError::MissingField(IMAGE_DATA));
        }
        Ok(record)
    }
}

// Pending server timestamps read back as null or as the sentinel object.
#[allow(clippy::cast_possible_truncation)]
fn millis_or_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| value.as_f64().map(|ms| ms as i64)))
}
