//! Still-image pipeline tests. These run in-process and need no external tools.

use std::io::Cursor;

use mediashrink_av::{ImageQuality, MediaInput, MediaKind, Transcoder};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

fn png(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Deterministic high-entropy image so quality changes show up in size.
fn noise(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x2545_f491;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        image::Rgb([next(), next(), next()])
    }))
}

#[test]
fn full_hd_png_becomes_jpeg_of_same_size() {
    let source = DynamicImage::ImageRgba8(RgbaImage::from_fn(1920, 1080, |x, y| {
        image::Rgba([(x / 8) as u8, (y / 5) as u8, 200, if x < 960 { 255 } else { 0 }])
    }));
    let input = MediaInput::new(png(&source), "screen.png", MediaKind::Image);

    let result = Transcoder::from_path()
        .transcode_image(&input, ImageQuality::new(50).unwrap())
        .unwrap();

    assert_eq!(result.mime_type, "image/jpeg");
    assert_eq!(result.suggested_file_name, "screen_compressed.jpg");
    let decoded = image::load_from_memory_with_format(&result.bytes, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1920, 1080));
    assert!(!decoded.color().has_alpha());
}

#[test]
fn higher_quality_is_never_smaller() {
    let input = MediaInput::new(png(&noise(256, 256)), "noise.png", MediaKind::Image);
    let transcoder = Transcoder::from_path();

    let sizes: Vec<usize> = [10u8, 50, 90]
        .into_iter()
        .map(|q| {
            transcoder
                .transcode_image(&input, ImageQuality::new(q).unwrap())
                .unwrap()
                .bytes
                .len()
        })
        .collect();
    assert!(sizes[0] <= sizes[1] && sizes[1] <= sizes[2], "{sizes:?}");
}

#[test]
fn out_of_range_quality_is_rejected() {
    assert!(ImageQuality::new(0).is_err());
    assert!(ImageQuality::new(101).is_err());
    assert!(ImageQuality::new(1).is_ok());
    assert!(ImageQuality::new(100).is_ok());
}
