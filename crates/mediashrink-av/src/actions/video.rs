//! Video pipeline: resize to a target height and re-encode to MP4.
//!
//! The engine works on files, so the upload is spilled to a scoped temp file
//! and the encode goes to a second one. Both are removed before this module
//! returns, whatever the outcome.

use std::path::Path;

use crate::engine::{CodecEngine, VideoEncodeParams};
use crate::error::EngineError;
use crate::media::{MediaInput, TranscodeResult, VideoBitrate, VideoResolution};
use crate::naming::compressed_name;
use crate::workspace::Workspace;
use crate::{Error, Result};

pub const VIDEO_MIME: &str = "video/mp4";

/// Transcode a video upload to MP4 at the resolution's target height.
///
/// Any failure (unreadable container, unsupported codec, disk error) comes
/// back as a single error; no output bytes are returned with it and no temp
/// file outlives the call.
pub fn transcode_video(
    engine: &dyn CodecEngine,
    workspace: &Workspace,
    input: &MediaInput,
    resolution: VideoResolution,
    bitrate: VideoBitrate,
) -> Result<TranscodeResult> {
    let file = input.file_name();
    let suffix = input
        .extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let source = workspace.acquire(&suffix, Some(input.bytes()))?;
    let outcome = decode_and_encode(engine, workspace, source.path(), file, resolution, bitrate);
    let encoded = source.settle(outcome)?;

    Ok(TranscodeResult::new(
        encoded,
        compressed_name(file, "mp4"),
        VIDEO_MIME,
    ))
}

fn decode_and_encode(
    engine: &dyn CodecEngine,
    workspace: &Workspace,
    source: &Path,
    file: &str,
    resolution: VideoResolution,
    bitrate: VideoBitrate,
) -> Result<Vec<u8>> {
    let info = engine
        .decode_file(source)
        .map_err(|e| Error::from_decode(file, e))?;
    let stream = info.video.ok_or_else(|| {
        Error::decode(file, EngineError::Unsupported("no video stream".to_string()))
    })?;

    // Rotation and pixel aspect are applied by the engine before scaling.
    let (shown_width, shown_height) = stream.display_dimensions();
    let (width, height) =
        scaled_dimensions(shown_width, shown_height, resolution.target_height()).ok_or_else(
            || {
                Error::decode(
                    file,
                    EngineError::Unsupported(format!(
                        "invalid frame size {shown_width}x{shown_height}"
                    )),
                )
            },
        )?;

    tracing::debug!(
        "resizing {file} from {shown_width}x{shown_height} (coded {}x{}, rotation {}) to {width}x{height}",
        stream.width,
        stream.height,
        stream.rotation
    );

    let params = VideoEncodeParams {
        width,
        height,
        bitrate,
    };

    let output = workspace.acquire(".mp4", None)?;
    let outcome = engine
        .encode_file(source, output.path(), &params)
        .map_err(|e| Error::from_encode(file, e))
        .and_then(|()| output.read())
        .and_then(|bytes| {
            if bytes.is_empty() {
                Err(Error::encode(file, "encoder produced an empty file"))
            } else {
                Ok(bytes)
            }
        });
    output.settle(outcome)
}

/// Frame size for `target_height` that keeps the source aspect ratio.
///
/// The width is rounded to the nearest even number (4:2:0 encoders need even
/// dimensions). Returns `None` for a degenerate source.
pub fn scaled_dimensions(width: u32, height: u32, target_height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || target_height == 0 {
        return None;
    }
    let exact = width as f64 * target_height as f64 / height as f64;
    let even = ((exact / 2.0).round() as u32 * 2).max(2);
    Some((even, target_height))
}
