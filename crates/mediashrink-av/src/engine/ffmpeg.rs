//! [`CodecEngine`] backed by the ffmpeg and ffprobe CLIs.
//!
//! Decoding shells out to `ffprobe -v error -print_format json -show_format
//! -show_streams`; encoding shells out to `ffmpeg`. Buffers are streamed
//! through stdin/stdout, files are passed by path.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;

use super::types::{AudioEncodeParams, AudioStream, StreamInfo, VideoEncodeParams, VideoStream};
use super::CodecEngine;
use crate::command::ToolCommand;
use crate::error::EngineError;
use crate::tools::{ToolOverrides, ToolRegistry};

/// Tunables for the ffmpeg engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// ffmpeg video encoder name.
    pub video_codec: String,
    /// ffmpeg audio encoder used for the soundtrack of video output.
    pub audio_codec: String,
    /// Encoder preset passed as `-preset`, if any.
    pub preset: Option<String>,
    /// Per-invocation limit; the tool is killed when it expires.
    pub timeout: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: Some("medium".to_string()),
            timeout: None,
        }
    }
}

/// Codec engine that drives the ffmpeg/ffprobe command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    tools: ToolRegistry,
    settings: EngineSettings,
}

impl FfmpegEngine {
    /// Create an engine using already discovered tools.
    pub fn new(tools: ToolRegistry, settings: EngineSettings) -> Self {
        Self { tools, settings }
    }

    /// Create an engine that finds ffmpeg/ffprobe on `PATH`.
    pub fn from_path() -> Self {
        Self::new(
            ToolRegistry::discover(&ToolOverrides::default()),
            EngineSettings::default(),
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn command(&self, tool: &str) -> Result<ToolCommand, EngineError> {
        let path = self.tools.require(tool)?;
        let mut cmd = ToolCommand::new(path.to_path_buf());
        cmd.timeout(self.settings.timeout);
        Ok(cmd)
    }

    fn ffprobe(&self, cmd: ToolCommand) -> Result<StreamInfo, EngineError> {
        let output = cmd.execute()?;
        let ff: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::parse_error("ffprobe", format!("JSON parse error: {e}")))?;
        parse_ffprobe_output(ff)
    }

    fn probe_command(&self) -> Result<ToolCommand, EngineError> {
        let mut cmd = self.command("ffprobe")?;
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        Ok(cmd)
    }
}

impl CodecEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn decode_buffer(&self, data: &Bytes) -> Result<StreamInfo, EngineError> {
        let mut cmd = self.probe_command()?;
        cmd.arg("pipe:0").stdin(data.clone());
        self.ffprobe(cmd)
    }

    fn encode_audio(
        &self,
        data: &Bytes,
        params: &AudioEncodeParams,
    ) -> Result<Vec<u8>, EngineError> {
        let mut cmd = self.command("ffmpeg")?;
        cmd.args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0"])
            // Drop cover art and any other non-audio stream.
            .arg("-vn")
            .args(["-ar", params.sample_rate.to_string().as_str()])
            .args(["-ac", params.channels.to_string().as_str()])
            .args(["-c:a", "libmp3lame", "-b:a", params.bitrate.as_str()])
            .args(["-f", "mp3", "pipe:1"])
            .stdin(data.clone());

        let output = cmd.execute()?;
        if output.stdout.is_empty() {
            return Err(EngineError::tool_failed("ffmpeg", "produced no audio output"));
        }
        Ok(output.stdout)
    }

    fn decode_file(&self, path: &Path) -> Result<StreamInfo, EngineError> {
        let mut cmd = self.probe_command()?;
        cmd.arg(path.as_os_str());
        self.ffprobe(cmd)
    }

    fn encode_file(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoEncodeParams,
    ) -> Result<(), EngineError> {
        let mut cmd = self.command("ffmpeg")?;
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(input.as_os_str())
            .args(["-map", "0:v:0", "-map", "0:a:0?"])
            .args(["-vf", format!("scale={}:{},setsar=1", params.width, params.height).as_str()])
            .args(["-c:v", self.settings.video_codec.as_str()]);
        if let Some(preset) = &self.settings.preset {
            cmd.args(["-preset", preset.as_str()]);
        }
        cmd.args(["-b:v", params.bitrate.as_str(), "-pix_fmt", "yuv420p"])
            .args(["-c:a", self.settings.audio_codec.as_str()])
            .args(["-movflags", "+faststart", "-f", "mp4"])
            .arg(output.as_os_str());

        cmd.execute()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    sample_aspect_ratio: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: FfprobeTags,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    /// Legacy rotation tag written by older muxers (e.g. `"90"`).
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    side_data_type: Option<String>,
    rotation: Option<f64>,
}

impl FfprobeStream {
    /// Display rotation in degrees, preferring the display matrix.
    fn rotation(&self) -> i32 {
        self.side_data_list
            .iter()
            .filter(|sd| sd.side_data_type.as_deref() == Some("Display Matrix"))
            .find_map(|sd| sd.rotation)
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
            .map(|deg: f64| deg.round() as i32)
            .unwrap_or(0)
    }

    /// Non-square pixel aspect ratio, if any.
    fn sample_aspect_ratio(&self) -> Option<(u32, u32)> {
        let (num, den) = self.sample_aspect_ratio.as_deref()?.split_once(':')?;
        let (num, den): (u32, u32) = (num.trim().parse().ok()?, den.trim().parse().ok()?);
        (num > 0 && den > 0 && num != den).then_some((num, den))
    }
}

fn parse_ffprobe_output(ff: FfprobeOutput) -> Result<StreamInfo, EngineError> {
    if ff.streams.is_empty() {
        return Err(EngineError::Unsupported("no media streams found".to_string()));
    }

    let video = ff
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("video"))
        .find(|s| s.disposition.attached_pic == 0)
        .and_then(|s| match (s.width, s.height) {
            (Some(width), Some(height)) => Some(VideoStream {
                codec: s.codec_name.clone(),
                width,
                height,
                rotation: s.rotation(),
                sample_aspect_ratio: s.sample_aspect_ratio(),
            }),
            _ => None,
        });

    let audio = ff
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStream {
            codec: s.codec_name.clone(),
            sample_rate: s.sample_rate.as_deref().and_then(|r| r.parse().ok()),
            channels: s.channels,
        });

    let (format_name, duration) = match ff.format {
        Some(f) => (f.format_name, f.duration.and_then(|d| d.parse().ok())),
        None => (None, None),
    };

    Ok(StreamInfo {
        format_name,
        duration,
        video,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(json: &str) -> Result<StreamInfo, EngineError> {
        parse_ffprobe_output(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn parses_wav_stream() {
        let info = parse(
            r#"{
                "streams": [{"codec_type": "audio", "codec_name": "pcm_s16le",
                             "sample_rate": "48000", "channels": 2}],
                "format": {"format_name": "wav", "duration": "5.000000"}
            }"#,
        )
        .unwrap();

        assert_eq!(info.format_name.as_deref(), Some("wav"));
        assert_eq!(info.duration, Some(5.0));
        assert!(info.video.is_none());
        let audio = info.audio.unwrap();
        assert_eq!(audio.sample_rate, Some(48_000));
        assert_eq!(audio.channels, Some(2));
    }

    #[test]
    fn skips_cover_art() {
        let info = parse(
            r#"{
                "streams": [
                    {"codec_type": "audio", "codec_name": "mp3", "sample_rate": "44100", "channels": 1},
                    {"codec_type": "video", "codec_name": "mjpeg", "width": 500, "height": 500,
                     "disposition": {"attached_pic": 1}}
                ],
                "format": {"format_name": "mp3"}
            }"#,
        )
        .unwrap();
        assert!(info.video.is_none());
        assert!(info.audio.is_some());
    }

    #[test]
    fn parses_video_geometry() {
        let info = parse(
            r#"{
                "streams": [
                    {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080},
                    {"codec_type": "audio", "codec_name": "aac", "sample_rate": "48000", "channels": 2}
                ],
                "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "12.5"}
            }"#,
        )
        .unwrap();
        assert_eq!(
            info.video,
            Some(VideoStream::new(Some("h264".to_string()), 1920, 1080))
        );
    }

    #[test]
    fn display_matrix_rotation_is_parsed() {
        let info = parse(
            r#"{
                "streams": [
                    {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                     "sample_aspect_ratio": "1:1",
                     "side_data_list": [{"side_data_type": "Display Matrix",
                                         "displaymatrix": "...", "rotation": -90}]}
                ],
                "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
            }"#,
        )
        .unwrap();
        let video = info.video.unwrap();
        assert_eq!(video.rotation, -90);
        assert_eq!(video.sample_aspect_ratio, None);
        assert_eq!(video.display_dimensions(), (1080, 1920));
    }

    #[test]
    fn legacy_rotate_tag_and_pixel_aspect() {
        let info = parse(
            r#"{
                "streams": [
                    {"codec_type": "video", "codec_name": "dvvideo", "width": 720, "height": 576,
                     "sample_aspect_ratio": "64:45", "tags": {"rotate": "90"}}
                ]
            }"#,
        )
        .unwrap();
        let video = info.video.unwrap();
        assert_eq!(video.rotation, 90);
        assert_eq!(video.sample_aspect_ratio, Some((64, 45)));
        assert_eq!(video.display_dimensions(), (576, 1024));
    }

    #[test]
    fn empty_stream_list_is_unsupported() {
        assert_matches!(parse(r#"{"streams": []}"#), Err(EngineError::Unsupported(_)));
        assert_matches!(parse("{}"), Err(EngineError::Unsupported(_)));
    }

    #[test]
    fn missing_tools_surface_as_tool_not_found() {
        let engine = FfmpegEngine::new(ToolRegistry::default(), EngineSettings::default());
        assert_matches!(
            engine.decode_buffer(&Bytes::from_static(b"RIFF")),
            Err(EngineError::ToolNotFound { ref tool }) if tool == "ffprobe"
        );
        assert_matches!(
            engine.decode_file(Path::new("/tmp/x.mp4")),
            Err(EngineError::ToolNotFound { .. })
        );
    }
}
