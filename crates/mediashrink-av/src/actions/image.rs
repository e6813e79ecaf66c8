//! Still-image pipeline: normalize colour, encode JPEG.
//!
//! Images never leave the process; the `image` crate does both decode and
//! encode on in-memory buffers.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::media::{ImageQuality, MediaInput, TranscodeResult};
use crate::naming::compressed_name;
use crate::{Error, Result};

pub const IMAGE_MIME: &str = "image/jpeg";

/// Transcode a still image to JPEG at `quality`.
///
/// Non-JPEG sources are converted to 8-bit RGB (alpha dropped) before
/// encoding. JPEG sources keep their greyscale or RGB layout; anything else
/// they decode to is converted to RGB as well.
pub fn transcode_image(input: &MediaInput, quality: ImageQuality) -> Result<TranscodeResult> {
    let file = input.file_name();

    let reader = ImageReader::new(Cursor::new(input.bytes().as_ref()))
        .with_guessed_format()
        .map_err(|e| Error::decode(file, e))?;
    let source_format = reader.format();
    let decoded = reader.decode().map_err(|e| Error::decode(file, e))?;

    tracing::debug!(
        "decoded {file}: {}x{} {:?} ({:?})",
        decoded.width(),
        decoded.height(),
        decoded.color(),
        source_format,
    );

    let normalized = normalize_color(decoded, source_format == Some(ImageFormat::Jpeg));

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality.get());
    normalized
        .write_with_encoder(encoder)
        .map_err(|e| Error::encode(file, e))?;

    Ok(TranscodeResult::new(
        encoded,
        compressed_name(file, "jpg"),
        IMAGE_MIME,
    ))
}

/// Bring a decoded image into a pixel layout the JPEG encoder accepts.
///
/// Idempotent: an RGB8 image comes back unchanged.
pub fn normalize_color(image: DynamicImage, jpeg_source: bool) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) if jpeg_source => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}
