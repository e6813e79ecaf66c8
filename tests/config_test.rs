//! Configuration loading and validation tests.

use mediashrink::config::{load_config, validate_config, Config};
use mediashrink_av::{AudioBitrate, ImageQuality, VideoBitrate, VideoResolution};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.defaults.audio_bitrate, AudioBitrate::K64);
    assert_eq!(config.defaults.image_quality.get(), 50);
    assert_eq!(config.defaults.video_resolution, VideoResolution::P720);
    assert_eq!(config.defaults.video_bitrate, VideoBitrate::K1000);
    assert_eq!(config.temp.prefix, "mediashrink-");

    let settings = config.engine_settings();
    assert_eq!(settings.video_codec, "libx264");
    assert_eq!(settings.audio_codec, "aac");
    assert_eq!(settings.preset.as_deref(), Some("medium"));
    assert_eq!(settings.timeout, None);
}

#[test]
fn full_config_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(&format!(
        r#"
[tools]
timeout_secs = 30

[temp]
dir = "{}"
prefix = "upload-"

[video]
codec = "libx265"
preset = ""

[defaults]
audio_bitrate = "192k"
image_quality = 80
video_resolution = "1080p"
video_bitrate = "2000k"
"#,
        dir.path().display()
    ));

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.defaults.audio_bitrate, AudioBitrate::K192);
    assert_eq!(config.defaults.image_quality, ImageQuality::new(80).unwrap());
    assert_eq!(config.defaults.video_resolution, VideoResolution::P1080);
    assert_eq!(config.defaults.video_bitrate, VideoBitrate::K2000);

    let settings = config.engine_settings();
    assert_eq!(settings.video_codec, "libx265");
    assert_eq!(settings.audio_codec, "aac");
    assert_eq!(settings.preset, None);
    assert_eq!(settings.timeout, Some(Duration::from_secs(30)));

    let workspace = config.workspace();
    assert_eq!(workspace.root(), dir.path());
    assert_eq!(workspace.prefix(), "upload-");
}

#[test]
fn out_of_domain_values_are_rejected() {
    for bad in [
        "[defaults]\naudio_bitrate = \"100k\"\n",
        "[defaults]\nimage_quality = 0\n",
        "[defaults]\nimage_quality = 101\n",
        "[defaults]\nvideo_resolution = \"4k\"\n",
    ] {
        let file = write_config(bad);
        assert!(load_config(file.path()).is_err(), "accepted: {bad}");
    }
}

#[test]
fn empty_codec_and_zero_timeout_fail_validation() {
    let mut config = Config::default();
    config.video.codec = "  ".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = Config::default();
    config.tools.timeout_secs = Some(0);
    assert!(validate_config(&config).is_err());

    let mut config = Config::default();
    config.tools.ffmpeg_path = Some("/nonexistent/ffmpeg".into());
    assert!(validate_config(&config).is_ok());
}

#[test]
fn temp_prefix_must_be_a_plain_name() {
    for bad in ["", "tmp/upload-", "..\\upload-"] {
        let mut config = Config::default();
        config.temp.prefix = bad.to_string();
        assert!(validate_config(&config).is_err(), "accepted prefix {bad:?}");
    }

    let file = write_config("[temp]\nprefix = \"\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("temp.prefix"), "{err:#}");

    let mut config = Config::default();
    config.temp.prefix = "upload.".to_string();
    assert!(validate_config(&config).is_ok());
}

#[test]
fn tool_paths_become_overrides() {
    let file = write_config("[tools]\nffmpeg_path = \"/opt/ff/ffmpeg\"\n");
    let config = load_config(file.path()).unwrap();
    let overrides = config.tools.overrides();
    assert_eq!(overrides.ffmpeg.as_deref(), Some(std::path::Path::new("/opt/ff/ffmpeg")));
    assert!(overrides.ffprobe.is_none());
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_config(std::path::Path::new("/nonexistent/mediashrink.toml")).is_err());
}
