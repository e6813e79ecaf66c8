//! Stream descriptions and encode parameters exchanged with a codec engine.

use serde::{Deserialize, Serialize};

use crate::media::{AudioBitrate, VideoBitrate};

/// What a decode step learned about a media stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Container format name as reported by the engine (e.g. "wav").
    pub format_name: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// First real video stream (cover art excluded).
    pub video: Option<VideoStream>,
    /// First audio stream.
    pub audio: Option<AudioStream>,
}

/// Geometry and codec of a video stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStream {
    pub codec: Option<String>,
    /// Coded (stored) frame width.
    pub width: u32,
    /// Coded (stored) frame height.
    pub height: u32,
    /// Display rotation in degrees, as signalled by the container.
    #[serde(default)]
    pub rotation: i32,
    /// Pixel aspect ratio as `(num, den)`, when known and not square.
    #[serde(default)]
    pub sample_aspect_ratio: Option<(u32, u32)>,
}

impl VideoStream {
    /// A square-pixel, unrotated stream.
    pub fn new(codec: Option<String>, width: u32, height: u32) -> Self {
        Self {
            codec,
            width,
            height,
            rotation: 0,
            sample_aspect_ratio: None,
        }
    }

    /// Frame size as it is shown: pixel aspect applied, then rotation.
    ///
    /// ffmpeg autorotates before user filters run, so this is the geometry
    /// the scale filter sees.
    pub fn display_dimensions(&self) -> (u32, u32) {
        let width = match self.sample_aspect_ratio {
            Some((num, den)) if num > 0 && den > 0 && num != den => {
                let scaled = (u64::from(self.width) * u64::from(num) + u64::from(den) / 2)
                    / u64::from(den);
                u32::try_from(scaled).unwrap_or(u32::MAX)
            }
            _ => self.width,
        };
        if self.rotation.rem_euclid(180) == 90 {
            (self.height, width)
        } else {
            (width, self.height)
        }
    }
}

/// Sample layout and codec of an audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStream {
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

/// Parameters for the audio encode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncodeParams {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    pub bitrate: AudioBitrate,
}

/// Parameters for the video encode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoEncodeParams {
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    pub bitrate: VideoBitrate,
}
