//! Codec engine capability.
//!
//! The pipelines never talk to ffmpeg directly; they go through
//! [`CodecEngine`], so an engine with different I/O abilities can be swapped
//! in without touching the transcoders.

mod ffmpeg;
mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

use std::path::Path;

use bytes::Bytes;

use crate::error::EngineError;

pub use ffmpeg::{EngineSettings, FfmpegEngine};
pub use types::{AudioEncodeParams, AudioStream, StreamInfo, VideoEncodeParams, VideoStream};

/// External decode/encode capability used by the transcoders.
///
/// Audio is handled buffer-to-buffer; video goes through files because the
/// ffmpeg engine cannot seek inside piped containers such as MP4.
pub trait CodecEngine: Send + Sync {
    /// Short engine name for logging.
    fn name(&self) -> &'static str;

    /// Parse an in-memory media stream and describe its streams.
    fn decode_buffer(&self, data: &Bytes) -> Result<StreamInfo, EngineError>;

    /// Decode an in-memory audio stream, resample/downmix it per `params` and
    /// return the encoded MP3 bytes.
    fn encode_audio(&self, data: &Bytes, params: &AudioEncodeParams)
        -> Result<Vec<u8>, EngineError>;

    /// Parse the media file at `path` and describe its streams.
    fn decode_file(&self, path: &Path) -> Result<StreamInfo, EngineError>;

    /// Resize and re-encode the video at `input` into an MP4 at `output`.
    fn encode_file(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoEncodeParams,
    ) -> Result<(), EngineError>;
}
