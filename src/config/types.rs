use std::path::PathBuf;
use std::time::Duration;

use mediashrink_av::{
    AudioBitrate, EngineSettings, ImageQuality, ToolOverrides, VideoBitrate, VideoResolution,
    Workspace,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub temp: TempConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Config {
    /// Workspace for scoped temp files, honouring `[temp]`.
    pub fn workspace(&self) -> Workspace {
        let workspace = match &self.temp.dir {
            Some(dir) => {
                let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
                Workspace::new(expanded)
            }
            None => Workspace::system(),
        };
        workspace.with_prefix(self.temp.prefix.clone())
    }

    /// Settings for the ffmpeg engine, from `[video]` and `[tools]`.
    pub fn engine_settings(&self) -> EngineSettings {
        let preset = self.video.preset.trim();
        EngineSettings {
            video_codec: self.video.codec.clone(),
            audio_codec: self.video.audio_codec.clone(),
            preset: (!preset.is_empty()).then(|| preset.to_string()),
            timeout: self.tools.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Per-invocation limit for ffmpeg/ffprobe, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn overrides(&self) -> ToolOverrides {
        ToolOverrides {
            ffmpeg: self.ffmpeg_path.clone(),
            ffprobe: self.ffprobe_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TempConfig {
    /// Directory for scoped temp files (defaults to the system temp dir).
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_temp_prefix")]
    pub prefix: String,
}

fn default_temp_prefix() -> String {
    mediashrink_av::workspace::DEFAULT_PREFIX.to_string()
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_temp_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    #[serde(default = "default_video_codec")]
    pub codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Encoder preset; empty disables `-preset`.
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
        }
    }
}

/// Option values used when a command-line flag is omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub audio_bitrate: AudioBitrate,

    #[serde(default)]
    pub image_quality: ImageQuality,

    #[serde(default)]
    pub video_resolution: VideoResolution,

    #[serde(default)]
    pub video_bitrate: VideoBitrate,
}
