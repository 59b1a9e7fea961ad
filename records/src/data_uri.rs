//! `data:` URI wrapping for binary payloads stored in string fields.

#[cfg(test)]
#[path = "data_uri_test.rs"]
mod data_uri_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::RecordError;

/// MIME type of encoded layer snapshots.
pub const PNG_MIME: &str = "image/png";

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Wrap `bytes` as `data:{mime};base64,{payload}`.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Unwrap a base64 data URI.
///
/// # Errors
///
/// Returns [`RecordError::NotDataUri`] when the scheme or payload separator is
/// missing, [`RecordError::NotBase64`] for non-base64 URIs, and
/// [`RecordError::Base64`] for a corrupt payload.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, RecordError> {
    let rest = uri.trim().strip_prefix("data:").ok_or(RecordError::NotDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(RecordError::NotDataUri)?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(RecordError::NotBase64(meta.to_owned()));
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(DataUri { mime: mime.to_owned(), bytes })
}
