//! # mediashrink-av
//!
//! Size-reducing transcodes for user uploads.
//!
//! This crate provides:
//! - Audio normalization to mono 44.1 kHz MP3 at a chosen bitrate
//! - Still-image re-encoding to JPEG at a chosen quality
//! - Video resizing to a target height and re-encoding to MP4
//! - Scoped temp files for engines that need file-backed I/O
//!
//! Audio and video go through a [`CodecEngine`]; the default
//! [`FfmpegEngine`] drives the `ffmpeg` and `ffprobe` CLIs. Images are
//! handled in-process.
//!
//! ## Example
//!
//! ```no_run
//! use mediashrink_av::{MediaInput, MediaKind, TranscodeOptions, Transcoder, VideoResolution, VideoBitrate};
//!
//! let transcoder = Transcoder::from_path();
//! let input = MediaInput::new(std::fs::read("clip.mov")?, "clip.mov", MediaKind::Video);
//! let result = transcoder.transcode(
//!     &input,
//!     TranscodeOptions::Video {
//!         resolution: VideoResolution::P720,
//!         bitrate: VideoBitrate::K1000,
//!     },
//! )?;
//! assert_eq!(result.suggested_file_name, "clip_compressed.mp4");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actions;
pub mod command;
pub mod engine;
mod error;
pub mod media;
mod naming;
pub mod tools;
pub mod workspace;

use std::sync::Arc;
use std::time::Instant;

pub use command::{ToolCommand, ToolOutput};
pub use engine::{CodecEngine, EngineSettings, FfmpegEngine, StreamInfo};
pub use error::{BoxError, EngineError, Error, Result};
pub use media::{
    AudioBitrate, ImageQuality, MediaInput, MediaKind, TranscodeOptions, TranscodeResult,
    VideoBitrate, VideoResolution,
};
pub use naming::{compressed_name, derive_name, COMPRESSED_SUFFIX};
pub use tools::{ToolInfo, ToolOverrides, ToolRegistry};
pub use workspace::{TempResource, Workspace};

/// Entry point for transcoding uploads.
///
/// Holds the codec engine and the temp workspace. Cheap to clone and safe
/// to share across threads; every call is independent.
#[derive(Clone)]
pub struct Transcoder {
    engine: Arc<dyn CodecEngine>,
    workspace: Workspace,
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("engine", &self.engine.name())
            .field("workspace", &self.workspace)
            .finish()
    }
}

impl Transcoder {
    pub fn new(engine: Arc<dyn CodecEngine>, workspace: Workspace) -> Self {
        Self { engine, workspace }
    }

    /// Transcoder using ffmpeg/ffprobe from `PATH` and the system temp dir.
    pub fn from_path() -> Self {
        Self::new(Arc::new(FfmpegEngine::from_path()), Workspace::system())
    }

    pub fn engine(&self) -> &dyn CodecEngine {
        self.engine.as_ref()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Transcode `input` with `options`.
    ///
    /// The options variant must match the input's kind; a mismatch is a
    /// [`Error::Precondition`] and no decoding is attempted.
    pub fn transcode(
        &self,
        input: &MediaInput,
        options: TranscodeOptions,
    ) -> Result<TranscodeResult> {
        if options.kind() != input.kind() {
            return Err(Error::precondition(format!(
                "{} options given for {} input {}",
                options.kind(),
                input.kind(),
                input.file_name()
            )));
        }

        let started = Instant::now();
        tracing::info!(
            "Transcoding {} ({}, {} bytes)",
            input.file_name(),
            input.kind(),
            input.len()
        );

        let result = match options {
            TranscodeOptions::Audio { bitrate } => {
                actions::transcode_audio(self.engine.as_ref(), input, bitrate)
            }
            TranscodeOptions::Image { quality } => actions::transcode_image(input, quality),
            TranscodeOptions::Video {
                resolution,
                bitrate,
            } => actions::transcode_video(
                self.engine.as_ref(),
                &self.workspace,
                input,
                resolution,
                bitrate,
            ),
        };

        match &result {
            Ok(out) => tracing::info!(
                "Transcoded {} -> {} ({} bytes) in {:?}",
                input.file_name(),
                out.suggested_file_name,
                out.bytes.len(),
                started.elapsed()
            ),
            Err(e) => tracing::warn!("Transcode of {} failed: {e}", input.file_name()),
        }
        result
    }

    /// Transcode an audio input to MP3.
    pub fn transcode_audio(
        &self,
        input: &MediaInput,
        bitrate: AudioBitrate,
    ) -> Result<TranscodeResult> {
        self.transcode(input, TranscodeOptions::Audio { bitrate })
    }

    /// Transcode an image input to JPEG.
    pub fn transcode_image(
        &self,
        input: &MediaInput,
        quality: ImageQuality,
    ) -> Result<TranscodeResult> {
        self.transcode(input, TranscodeOptions::Image { quality })
    }

    /// Transcode a video input to MP4.
    pub fn transcode_video(
        &self,
        input: &MediaInput,
        resolution: VideoResolution,
        bitrate: VideoBitrate,
    ) -> Result<TranscodeResult> {
        self.transcode(input, TranscodeOptions::Video { resolution, bitrate })
    }
}
