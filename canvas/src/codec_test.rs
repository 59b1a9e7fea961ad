use tiny_skia::{Paint, Rect, Transform};

use super::*;

fn painted(size: ImageSize) -> Layer {
    let mut layer = Layer::new(size).expect("layer");
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 0, 0, 255);
    let rect = Rect::from_xywh(2.0, 2.0, 4.0, 4.0).expect("rect");
    layer.pixmap_mut().fill_rect(rect, &paint, Transform::identity(), None);
    layer
}

#[test]
fn encoded_layer_is_png_data_uri() {
    let uri = encode_layer(&painted(ImageSize::new(10, 10))).expect("encode");
    assert!(uri.starts_with("data:image/png;base64,"));
}

#[test]
fn decode_restores_opaque_pixels_exactly() {
    let size = ImageSize::new(10, 10);
    let original = painted(size);
    let uri = encode_layer(&original).expect("encode");
    let decoded = decode_layer(&uri, size).expect("decode");
    assert_eq!(decoded, original);
}

#[test]
fn decode_rescales_foreign_dimensions() {
    let uri = encode_layer(&painted(ImageSize::new(10, 10))).expect("encode");
    let decoded = decode_layer(&uri, ImageSize::new(20, 20)).expect("decode");
    assert_eq!(decoded.size(), ImageSize::new(20, 20));
    let inside = decoded.pixel(8, 8).expect("pixel");
    assert_eq!(inside.alpha(), 255);
    assert!(decoded.pixel(0, 0).expect("pixel").alpha() == 0);
}

#[test]
fn decode_rejects_non_png_mime() {
    let uri = records::encode_data_uri("image/jpeg", &[1, 2, 3]);
    let err = decode_layer(&uri, ImageSize::new(4, 4)).expect_err("jpeg");
    assert!(matches!(err, CodecError::UnsupportedMime(m) if m == "image/jpeg"));
}

#[test]
fn decode_rejects_corrupt_payload() {
    let uri = records::encode_data_uri(PNG_MIME, b"not a png");
    assert!(matches!(decode_layer(&uri, ImageSize::new(4, 4)), Err(CodecError::Png(_))));
}

#[test]
fn decode_rejects_plain_strings() {
    assert!(matches!(
        decode_layer("hello", ImageSize::new(4, 4)),
        Err(CodecError::Record(RecordError::NotDataUri))
    ));
}
