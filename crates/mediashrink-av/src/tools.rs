//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the external
//! CLI tools the ffmpeg engine shells out to (ffmpeg, ffprobe).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Known tool names that the registry manages.
pub const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// User-supplied tool locations that take precedence over `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOverrides {
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,
}

impl ToolOverrides {
    fn get(&self, name: &str) -> Option<&Path> {
        match name {
            "ffmpeg" => self.ffmpeg.as_deref(),
            "ffprobe" => self.ffprobe.as_deref(),
            _ => None,
        }
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides).
    ///
    /// An override is used only if the path exists; otherwise the tool is
    /// looked up on `PATH`. Tools that are not found are omitted.
    pub fn discover(overrides: &ToolOverrides) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match overrides.get(name) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "configured {name} path {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!("found {name} at {}", path.display());
                    tools.insert(name.to_string(), path);
                }
                None => tracing::debug!("{name} not found"),
            }
        }

        Self { tools }
    }

    /// Build a registry from explicit paths, bypassing discovery.
    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = (S, PathBuf)>,
        S: Into<String>,
    {
        Self {
            tools: paths.into_iter().map(|(n, p)| (n.into(), p)).collect(),
        }
    }

    /// Path of the given tool, or [`EngineError::ToolNotFound`].
    pub fn require(&self, name: &str) -> Result<&Path, EngineError> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| EngineError::tool_not_found(name))
    }

    /// Whether the given tool was discovered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn discover_with_default_overrides() {
        let registry = ToolRegistry::discover(&ToolOverrides::default());
        // We cannot guarantee any tool is installed in CI,
        // but the call itself must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        assert_matches!(
            registry.require("ffmpeg"),
            Err(EngineError::ToolNotFound { ref tool }) if tool == "ffmpeg"
        );
    }

    #[test]
    fn check_all_returns_known_tools() {
        let registry = ToolRegistry::default();
        let infos = registry.check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
        assert!(infos.iter().all(|i| !i.available));
    }

    #[test]
    fn missing_override_falls_back_to_path() {
        let overrides = ToolOverrides {
            ffmpeg: Some(PathBuf::from("/nonexistent/ffmpeg")),
            ffprobe: None,
        };
        let registry = ToolRegistry::discover(&overrides);
        if let Ok(path) = registry.require("ffmpeg") {
            assert_ne!(path, Path::new("/nonexistent/ffmpeg"));
        }
    }

    #[test]
    fn existing_override_wins() {
        let fake = tempfile::NamedTempFile::new().unwrap();
        let overrides = ToolOverrides {
            ffmpeg: None,
            ffprobe: Some(fake.path().to_path_buf()),
        };
        let registry = ToolRegistry::discover(&overrides);
        assert_eq!(registry.require("ffprobe").unwrap(), fake.path());
    }

    #[test]
    fn with_paths_registers_tools() {
        let registry = ToolRegistry::with_paths([("ffmpeg", PathBuf::from("/opt/ffmpeg"))]);
        assert!(registry.has("ffmpeg"));
        assert!(!registry.has("ffprobe"));
    }
}
