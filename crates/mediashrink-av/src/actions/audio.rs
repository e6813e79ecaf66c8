//! Audio pipeline: resample to 44.1 kHz, downmix to mono, encode MP3.

use crate::engine::{AudioEncodeParams, CodecEngine};
use crate::error::EngineError;
use crate::media::{AudioBitrate, MediaInput, TranscodeResult};
use crate::naming::compressed_name;
use crate::{Error, Result};

/// Output sample rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Output channel count.
pub const TARGET_CHANNELS: u16 = 1;

pub const AUDIO_MIME: &str = "audio/mpeg";

/// Transcode an audio upload to mono 44.1 kHz MP3 at `bitrate`.
///
/// Resampling and downmixing always run, so already conforming input is
/// passed through the same encode path. Everything stays in memory.
pub fn transcode_audio(
    engine: &dyn CodecEngine,
    input: &MediaInput,
    bitrate: AudioBitrate,
) -> Result<TranscodeResult> {
    let file = input.file_name();

    let info = engine
        .decode_buffer(input.bytes())
        .map_err(|e| Error::from_decode(file, e))?;
    let source = info.audio.ok_or_else(|| {
        Error::decode(file, EngineError::Unsupported("no audio stream".to_string()))
    })?;

    tracing::debug!(
        "decoded {file}: {} Hz, {} channel(s), codec {}",
        source.sample_rate.unwrap_or_default(),
        source.channels.unwrap_or_default(),
        source.codec.as_deref().unwrap_or("unknown"),
    );

    let params = AudioEncodeParams {
        sample_rate: TARGET_SAMPLE_RATE,
        channels: TARGET_CHANNELS,
        bitrate,
    };
    let encoded = engine
        .encode_audio(input.bytes(), &params)
        .map_err(|e| Error::from_encode(file, e))?;

    Ok(TranscodeResult::new(
        encoded,
        compressed_name(file, "mp3"),
        AUDIO_MIME,
    ))
}
