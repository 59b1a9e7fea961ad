//! Layer raster codec: layer pixels to and from PNG data URIs.
//!
//! The stored form of a layer is a lossless PNG of the whole raster wrapped
//! in a `data:image/png;base64,` URI. Decoding always yields a layer at the
//! reference image's native size; a snapshot with other dimensions is scaled
//! to fit rather than rejected.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is a [`CodecError`]. Callers on the receive path log and
//! drop the payload, keeping whatever layer they already hold.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use records::{PNG_MIME, RecordError, decode_data_uri, encode_data_uri};
use tiny_skia::Pixmap;

use crate::layer::Layer;
use crate::viewport::ImageSize;

/// Error returned when a layer cannot be encoded or decoded.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The data URI wrapper is malformed.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// The payload is not an image type the codec reads.
    #[error("unsupported image type: {0}")]
    UnsupportedMime(String),
    /// PNG encoding or decoding failed.
    #[error("png: {0}")]
    Png(String),
    /// The target dimensions cannot hold a raster.
    #[error("cannot allocate a {width}x{height} layer")]
    Allocation { width: u32, height: u32 },
}

/// Encode `layer` as a PNG data URI.
///
/// # Errors
///
/// Returns [`CodecError::Png`] if the PNG encoder fails.
pub fn encode_layer(layer: &Layer) -> Result<String, CodecError> {
    let bytes = layer.pixmap().encode_png().map_err(|e| CodecError::Png(e.to_string()))?;
    Ok(encode_data_uri(PNG_MIME, &bytes))
}

/// Decode a PNG data URI into a layer of exactly `size`.
///
/// # Errors
///
/// Returns [`CodecError`] when the URI, MIME type, or PNG payload is unusable.
pub fn decode_layer(uri: &str, size: ImageSize) -> Result<Layer, CodecError> {
    let data = decode_data_uri(uri)?;
    if data.mime != PNG_MIME {
        return Err(CodecError::UnsupportedMime(data.mime));
    }
    let pixmap = Pixmap::decode_png(&data.bytes).map_err(|e| CodecError::Png(e.to_string()))?;
    Layer::fitted(pixmap, size).ok_or(CodecError::Allocation { width: size.width, height: size.height })
}
