//! Per-kind transcode pipelines.
//!
//! - Audio: resample to 44.1 kHz mono and encode MP3
//! - Image: normalize colour and encode JPEG
//! - Video: resize to a target height and encode MP4

mod audio;
mod image;
mod video;

pub use audio::{transcode_audio, AUDIO_MIME, TARGET_CHANNELS, TARGET_SAMPLE_RATE};
pub use image::{normalize_color, transcode_image, IMAGE_MIME};
pub use video::{scaled_dimensions, transcode_video, VIDEO_MIME};
