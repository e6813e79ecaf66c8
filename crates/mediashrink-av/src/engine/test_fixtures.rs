//! In-process [`CodecEngine`] double for pipeline tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;

use super::types::{AudioEncodeParams, AudioStream, StreamInfo, VideoEncodeParams, VideoStream};
use super::CodecEngine;
use crate::error::EngineError;

/// Scripted engine that records what the pipelines asked of it.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pub video: Option<VideoStream>,
    pub audio: Option<AudioStream>,
    pub fail_decode: bool,
    pub fail_encode: bool,
    pub decoded_paths: Mutex<Vec<PathBuf>>,
    pub decoded_bytes: Mutex<Vec<Vec<u8>>>,
    pub encoded_video: Mutex<Vec<(PathBuf, VideoEncodeParams)>>,
    pub encoded_audio: Mutex<Vec<AudioEncodeParams>>,
}

impl FakeEngine {
    pub fn video(width: u32, height: u32) -> Self {
        Self::with_stream(VideoStream::new(Some("h264".to_string()), width, height))
    }

    pub fn with_stream(stream: VideoStream) -> Self {
        Self {
            video: Some(stream),
            ..Default::default()
        }
    }

    pub fn audio(sample_rate: u32, channels: u32) -> Self {
        Self {
            audio: Some(AudioStream {
                codec: Some("pcm_s16le".to_string()),
                sample_rate: Some(sample_rate),
                channels: Some(channels),
            }),
            ..Default::default()
        }
    }

    pub fn failing_decode() -> Self {
        Self {
            fail_decode: true,
            ..Default::default()
        }
    }

    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    fn info(&self) -> StreamInfo {
        StreamInfo {
            format_name: Some("fake".to_string()),
            duration: Some(1.0),
            video: self.video.clone(),
            audio: self.audio.clone(),
        }
    }
}

impl CodecEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn decode_buffer(&self, data: &Bytes) -> Result<StreamInfo, EngineError> {
        self.decoded_bytes.lock().unwrap().push(data.to_vec());
        if self.fail_decode {
            return Err(EngineError::tool_failed("fake", "Invalid data found"));
        }
        Ok(self.info())
    }

    fn encode_audio(
        &self,
        _data: &Bytes,
        params: &AudioEncodeParams,
    ) -> Result<Vec<u8>, EngineError> {
        self.encoded_audio.lock().unwrap().push(*params);
        if self.fail_encode {
            return Err(EngineError::tool_failed("fake", "Unknown encoder"));
        }
        Ok(format!(
            "mp3:{}:{}:{}",
            params.sample_rate, params.channels, params.bitrate
        )
        .into_bytes())
    }

    fn decode_file(&self, path: &Path) -> Result<StreamInfo, EngineError> {
        let contents = std::fs::read(path)?;
        self.decoded_paths.lock().unwrap().push(path.to_path_buf());
        self.decoded_bytes.lock().unwrap().push(contents);
        if self.fail_decode {
            return Err(EngineError::tool_failed("fake", "moov atom not found"));
        }
        Ok(self.info())
    }

    fn encode_file(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoEncodeParams,
    ) -> Result<(), EngineError> {
        assert!(input.exists(), "encode input must exist during encode");
        self.encoded_video
            .lock()
            .unwrap()
            .push((output.to_path_buf(), *params));
        if self.fail_encode {
            std::fs::write(output, b"partial")?;
            return Err(EngineError::tool_failed("fake", "Error while opening encoder"));
        }
        std::fs::write(output, format!("mp4:{}x{}", params.width, params.height))?;
        Ok(())
    }
}
