mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./mediashrink.toml", "~/.config/mediashrink/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.video.codec.trim().is_empty() {
        anyhow::bail!("video.codec cannot be empty");
    }
    if config.video.audio_codec.trim().is_empty() {
        anyhow::bail!("video.audio_codec cannot be empty");
    }

    let prefix = &config.temp.prefix;
    if prefix.is_empty() {
        anyhow::bail!("temp.prefix cannot be empty");
    }
    if prefix.contains(['/', '\\']) {
        anyhow::bail!("temp.prefix must be a file name prefix, not a path: {:?}", prefix);
    }

    if config.tools.timeout_secs == Some(0) {
        anyhow::bail!("tools.timeout_secs must be greater than 0");
    }

    let tool_paths = [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ];
    for (name, path) in tool_paths {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}
