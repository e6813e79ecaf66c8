//! Media inputs, per-kind transcode options and transcode results.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of media a file is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    /// File extensions accepted for upload, per kind.
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &["mp3", "wav"],
            MediaKind::Image => &["jpg", "jpeg", "png"],
            MediaKind::Video => &["mp4", "mov", "avi"],
        }
    }

    /// Look up the kind for an accepted extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        [MediaKind::Audio, MediaKind::Image, MediaKind::Video]
            .into_iter()
            .find(|kind| kind.accepted_extensions().contains(&ext.as_str()))
    }

    /// Look up the kind from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        extension_of(name).and_then(Self::from_extension)
    }

    /// Whether `name` carries an extension accepted for this kind.
    pub fn accepts(&self, name: &str) -> bool {
        Self::from_file_name(name) == Some(*self)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&base[idx + 1..]),
    }
}

/// An uploaded file: raw bytes plus its declared name and kind.
///
/// Immutable once built; the pipelines only borrow it.
#[derive(Debug, Clone)]
pub struct MediaInput {
    bytes: Bytes,
    file_name: String,
    kind: MediaKind,
}

impl MediaInput {
    /// Wrap uploaded bytes with their declared file name and kind.
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            kind,
        }
    }

    /// The raw input bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The declared file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The declared media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Size of the input in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the input holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lower-cased extension of the declared file name, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name).map(str::to_ascii_lowercase)
    }

    /// MIME type implied by the declared file name.
    pub fn source_mime(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("mp3") => "audio/mpeg",
            Some("wav") => "audio/wav",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("mp4") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("avi") => "video/x-msvideo",
            _ => "application/octet-stream",
        }
    }
}

/// Audio output bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioBitrate {
    #[default]
    #[serde(rename = "64k")]
    K64,
    #[serde(rename = "128k")]
    K128,
    #[serde(rename = "192k")]
    K192,
    #[serde(rename = "256k")]
    K256,
    #[serde(rename = "320k")]
    K320,
}

impl AudioBitrate {
    pub const ALL: [AudioBitrate; 5] = [
        AudioBitrate::K64,
        AudioBitrate::K128,
        AudioBitrate::K192,
        AudioBitrate::K256,
        AudioBitrate::K320,
    ];

    /// The ffmpeg-style bitrate string, e.g. `"128k"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioBitrate::K64 => "64k",
            AudioBitrate::K128 => "128k",
            AudioBitrate::K192 => "192k",
            AudioBitrate::K256 => "256k",
            AudioBitrate::K320 => "320k",
        }
    }

    /// Bitrate in bits per second.
    pub fn bits_per_second(&self) -> u32 {
        match self {
            AudioBitrate::K64 => 64_000,
            AudioBitrate::K128 => 128_000,
            AudioBitrate::K192 => 192_000,
            AudioBitrate::K256 => 256_000,
            AudioBitrate::K320 => 320_000,
        }
    }
}

impl fmt::Display for AudioBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioBitrate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidOption(format!(
                    "audio bitrate '{s}' (expected one of 64k, 128k, 192k, 256k, 320k)"
                ))
            })
    }
}

/// JPEG quality factor in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ImageQuality(u8);

impl ImageQuality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Validate a quality factor.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidOption(format!(
                "image quality {value} (expected {}..={})",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for ImageQuality {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<u8> for ImageQuality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ImageQuality> for u8 {
    fn from(q: ImageQuality) -> Self {
        q.0
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImageQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidOption(format!("image quality '{s}' is not a number")))?;
        Self::new(value)
    }
}

/// Video output resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl VideoResolution {
    pub const ALL: [VideoResolution; 3] = [
        VideoResolution::P480,
        VideoResolution::P720,
        VideoResolution::P1080,
    ];

    /// Output frame height in pixels.
    ///
    /// The `480p` preset deliberately maps to 270 lines.
    pub fn target_height(&self) -> u32 {
        match self {
            VideoResolution::P480 => 270,
            VideoResolution::P720 => 720,
            VideoResolution::P1080 => 1080,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoResolution::P480 => "480p",
            VideoResolution::P720 => "720p",
            VideoResolution::P1080 => "1080p",
        }
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VideoResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| {
                Error::InvalidOption(format!(
                    "video resolution '{s}' (expected one of 480p, 720p, 1080p)"
                ))
            })
    }
}

/// Video output bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoBitrate {
    #[serde(rename = "500k")]
    K500,
    #[default]
    #[serde(rename = "1000k")]
    K1000,
    #[serde(rename = "1500k")]
    K1500,
    #[serde(rename = "2000k")]
    K2000,
}

impl VideoBitrate {
    pub const ALL: [VideoBitrate; 4] = [
        VideoBitrate::K500,
        VideoBitrate::K1000,
        VideoBitrate::K1500,
        VideoBitrate::K2000,
    ];

    /// The ffmpeg-style bitrate string, e.g. `"1000k"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoBitrate::K500 => "500k",
            VideoBitrate::K1000 => "1000k",
            VideoBitrate::K1500 => "1500k",
            VideoBitrate::K2000 => "2000k",
        }
    }
}

impl fmt::Display for VideoBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoBitrate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidOption(format!(
                    "video bitrate '{s}' (expected one of 500k, 1000k, 1500k, 2000k)"
                ))
            })
    }
}

/// Per-kind transcode parameters.
///
/// The variant must match the [`MediaKind`] of the input it is used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TranscodeOptions {
    Audio {
        bitrate: AudioBitrate,
    },
    Image {
        quality: ImageQuality,
    },
    Video {
        resolution: VideoResolution,
        bitrate: VideoBitrate,
    },
}

impl TranscodeOptions {
    /// The media kind these options apply to.
    pub fn kind(&self) -> MediaKind {
        match self {
            TranscodeOptions::Audio { .. } => MediaKind::Audio,
            TranscodeOptions::Image { .. } => MediaKind::Image,
            TranscodeOptions::Video { .. } => MediaKind::Video,
        }
    }
}

/// Output of one successful transcode call.
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub bytes: Bytes,
    pub suggested_file_name: String,
    pub mime_type: &'static str,
}

impl TranscodeResult {
    pub fn new(
        bytes: impl Into<Bytes>,
        suggested_file_name: String,
        mime_type: &'static str,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            suggested_file_name,
            mime_type,
        }
    }

    /// Output size relative to `input_len` (0.5 means half the size).
    ///
    /// Returns `None` for an empty input.
    pub fn reduction_ratio(&self, input_len: usize) -> Option<f64> {
        (input_len > 0).then(|| self.bytes.len() as f64 / input_len as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn kind_from_extension() {
        assert_eq!(MediaKind::from_file_name("a.WAV"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_file_name("a.jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_file_name("dir/a.mov"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_file_name("a.flac"), None);
        assert_eq!(MediaKind::from_file_name("noext"), None);
        assert!(MediaKind::Video.accepts("clip.avi"));
        assert!(!MediaKind::Audio.accepts("clip.avi"));
    }

    #[test]
    fn source_mime_follows_extension() {
        let input = MediaInput::new(Bytes::new(), "clip.MOV", MediaKind::Video);
        assert_eq!(input.source_mime(), "video/quicktime");
        let input = MediaInput::new(Bytes::new(), "blob", MediaKind::Video);
        assert_eq!(input.source_mime(), "application/octet-stream");
    }

    #[test]
    fn parse_audio_bitrate() {
        assert_eq!("128k".parse::<AudioBitrate>().unwrap(), AudioBitrate::K128);
        assert_eq!(" 320K ".parse::<AudioBitrate>().unwrap(), AudioBitrate::K320);
        assert_matches!("96k".parse::<AudioBitrate>(), Err(Error::InvalidOption(_)));
        assert_eq!(AudioBitrate::default(), AudioBitrate::K64);
    }

    #[test]
    fn image_quality_bounds() {
        assert!(ImageQuality::new(0).is_err());
        assert_eq!(ImageQuality::new(1).unwrap().get(), 1);
        assert_eq!(ImageQuality::new(100).unwrap().get(), 100);
        assert!(ImageQuality::new(101).is_err());
        assert!("abc".parse::<ImageQuality>().is_err());
        assert_eq!(ImageQuality::default().get(), 50);
    }

    #[test]
    fn resolution_heights() {
        assert_eq!(VideoResolution::P480.target_height(), 270);
        assert_eq!(VideoResolution::P720.target_height(), 720);
        assert_eq!(VideoResolution::P1080.target_height(), 1080);
        assert_eq!("1080p".parse::<VideoResolution>().unwrap(), VideoResolution::P1080);
        assert!("4k".parse::<VideoResolution>().is_err());
    }

    #[test]
    fn parse_video_bitrate() {
        assert_eq!("1500k".parse::<VideoBitrate>().unwrap(), VideoBitrate::K1500);
        assert!("3000k".parse::<VideoBitrate>().is_err());
    }

    #[test]
    fn options_serde_round_trip() {
        let opts = TranscodeOptions::Video {
            resolution: VideoResolution::P480,
            bitrate: VideoBitrate::K500,
        };
        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(json, r#"{"kind":"video","resolution":"480p","bitrate":"500k"}"#);

        let bad = r#"{"kind":"image","quality":0}"#;
        assert!(serde_json::from_str::<TranscodeOptions>(bad).is_err());
    }

    #[test]
    fn reduction_ratio() {
        let result = TranscodeResult::new(vec![0u8; 25], "a.jpg".into(), "image/jpeg");
        assert_eq!(result.reduction_ratio(100), Some(0.25));
        assert_eq!(result.reduction_ratio(0), None);
    }
}
