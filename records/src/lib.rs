//! Persisted document shapes shared by the drawing core and the browser host.
//!
//! The external document store is schemaless; this crate pins down the few
//! shapes the drawing overlay reads and writes: where documents live
//! ([`path`]), what a per-participant layer snapshot looks like ([`layer`]),
//! the session fields the overlay follows ([`session`]), the change events a
//! live subscription yields ([`change`]), and the data-URI wrapping used for
//! raster payloads ([`data_uri`]).

pub mod change;
pub mod data_uri;
pub mod layer;
pub mod path;
pub mod session;
pub mod timestamp;

pub use change::{ChangeKind, DocChange, Document};
pub use data_uri::{DataUri, PNG_MIME, decode_data_uri, encode_data_uri};
pub use layer::LayerRecord;
pub use path::{CollectionPath, DocPath, PathError};

/// Error returned when a stored value cannot be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The string does not start with `data:` or has no payload separator.
    #[error("not a data URI")]
    NotDataUri,
    /// The data URI payload is not base64 encoded.
    #[error("data URI is not base64 encoded: {0}")]
    NotBase64(String),
    /// The base64 payload is malformed.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A required field is absent or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// The document body does not match the expected shape.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}
