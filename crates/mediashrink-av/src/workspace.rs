//! Scoped temp files for pipelines that need file-backed I/O.
//!
//! A [`Workspace`] names the directory and prefix used for temp files; each
//! [`Workspace::acquire`] hands out a [`TempResource`] whose path is unique
//! (random name, created with `O_EXCL`) and which is removed exactly once,
//! either explicitly via [`TempResource::release`] / [`TempResource::settle`]
//! or on drop.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::{Error, Result};

/// Default prefix for temp file names.
pub const DEFAULT_PREFIX: &str = "mediashrink-";

/// Where and how scoped temp files are created.
///
/// # Example
///
/// ```no_run
/// use mediashrink_av::Workspace;
///
/// let workspace = Workspace::system();
/// let size = workspace.with_temp_file(".bin", Some(b"hello"), |path| {
///     Ok(std::fs::metadata(path).map(|m| m.len()).unwrap_or(0))
/// })?;
/// assert_eq!(size, 5);
/// # Ok::<(), mediashrink_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    prefix: String,
}

impl Workspace {
    /// Create a workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Create a workspace in the system temp directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Use a custom file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Directory temp files are created in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name prefix of temp files.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Create a new temp file named `<prefix><random><suffix>`, optionally
    /// filled with `initial` content.
    ///
    /// If writing the initial content fails the half-written file is removed
    /// before the error is returned.
    pub fn acquire(&self, suffix: &str, initial: Option<&[u8]>) -> Result<TempResource> {
        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)
            .map_err(|e| {
                Error::resource(
                    format!("failed to create temp file in {}", self.root.display()),
                    e,
                )
            })?;

        if let Some(content) = initial {
            file.write_all(content)
                .and_then(|()| file.flush())
                .map_err(|e| {
                    Error::resource(
                        format!("failed to write temp file {}", file.path().display()),
                        e,
                    )
                })?;
        }

        let path = file.into_temp_path();
        tracing::trace!("acquired temp file {}", path.display());
        Ok(TempResource { path: Some(path) })
    }

    /// Run `f` with the path of a fresh temp file, removing the file on every
    /// exit path.
    ///
    /// An error from `f` wins over a cleanup failure; a cleanup failure after
    /// a successful `f` is returned as [`Error::Resource`].
    pub fn with_temp_file<T, F>(&self, suffix: &str, initial: Option<&[u8]>, f: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let resource = self.acquire(suffix, initial)?;
        let outcome = f(resource.path());
        resource.settle(outcome)
    }

    /// Count temp files in the root that carry this workspace's prefix.
    pub fn outstanding(&self) -> Result<usize> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            Error::resource(format!("failed to list {}", self.root.display()), e)
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&self.prefix))
            .count())
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::system()
    }
}

/// A temp file that exists until it is released or dropped.
#[derive(Debug)]
pub struct TempResource {
    path: Option<TempPath>,
}

impl TempResource {
    /// Path of the temp file.
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .expect("temp resource path is only taken by release")
    }

    /// Read the whole file into memory.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(self.path()).map_err(|e| {
            Error::resource(format!("failed to read temp file {}", self.path().display()), e)
        })
    }

    /// Remove the file now, reporting failure.
    pub fn release(mut self) -> Result<()> {
        match self.path.take() {
            Some(path) => {
                let shown = path.display().to_string();
                path.close().map_err(|e| {
                    Error::resource(format!("failed to remove temp file {shown}"), e)
                })?;
                tracing::trace!("released temp file {shown}");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Release the file and fold the cleanup result into `outcome`.
    ///
    /// The primary error of `outcome` is kept when both fail; the cleanup
    /// failure is only logged in that case.
    pub fn settle<T>(self, outcome: Result<T>) -> Result<T> {
        match (outcome, self.release()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => {
                tracing::warn!("temp file cleanup failed after error: {cleanup}");
                Err(err)
            }
        }
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown = path.display().to_string();
            if let Err(e) = path.close() {
                tracing::warn!("failed to remove temp file {shown}: {e}");
            }
        }
    }
}
