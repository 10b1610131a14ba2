//! Temporary file lifecycle
//!
//! All produced audio lives under one temp root. Standalone extractions write
//! straight into the root, named by video id, so two concurrent requests can
//! never collide. A batch gets its own scoped directory (a [`ScopedDir`])
//! that is removed when the guard drops, on success, error or cancellation.
//!
//! Standalone outputs that a caller never consumed (an abandoned request, a
//! crash between download and response) are reclaimed by
//! [`TempStore::prune_oldest`].

use crate::error::{Error, Result};
use crate::types::ItemId;
use crate::utils::{get_unique_path, sanitize_filename};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Where an extraction writes its output
#[derive(Clone, Debug)]
pub enum OutputScope {
    /// Default mode: the temp root, file named by video id
    Standalone,
    /// Inside a batch's scoped directory, file named by title
    Batch {
        /// The scoped directory
        dir: PathBuf,
        /// Collection title used for the album tag
        collection_title: String,
    },
}

impl OutputScope {
    /// How files are named in this scope
    pub fn naming(&self) -> NamingMode {
        match self {
            OutputScope::Standalone => NamingMode::ItemId,
            OutputScope::Batch { .. } => NamingMode::Title,
        }
    }

    /// Whether this scope is the shared temp root
    pub fn is_standalone(&self) -> bool {
        matches!(self, OutputScope::Standalone)
    }
}

/// Basename strategy for produced files
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingMode {
    /// `<item id>.<ext>`
    ItemId,
    /// `<sanitized title>.<ext>`, falling back to the id for empty titles
    Title,
}

/// A batch-scoped directory, deleted on drop
pub struct ScopedDir {
    inner: tempfile::TempDir,
}

impl ScopedDir {
    /// Path of the directory
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Final path component, used to name the batch's archive
    pub fn name(&self) -> String {
        self.inner
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch".to_string())
    }
}

/// Owner of the temp root
#[derive(Clone, Debug)]
pub struct TempStore {
    root: PathBuf,
    extension: String,
}

impl TempStore {
    /// Create a store rooted at `root` producing `.<extension>` files
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// The temp root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension of produced audio files, without the dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Create the temp root if it doesn't exist
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to create temp root {}: {}",
                self.root.display(),
                e
            )))
        })
    }

    /// Directory an extraction in `scope` writes into
    pub fn output_dir<'a>(&'a self, scope: &'a OutputScope) -> &'a Path {
        match scope {
            OutputScope::Standalone => &self.root,
            OutputScope::Batch { dir, .. } => dir,
        }
    }

    /// Pick the basename (no extension) for an item in `scope`
    ///
    /// Id-named files are deterministic. Title-named files get a numeric
    /// suffix if another entry in the same directory already has that name.
    pub fn reserve_basename(&self, scope: &OutputScope, id: &ItemId, title: &str) -> String {
        match scope.naming() {
            NamingMode::ItemId => id.to_string(),
            NamingMode::Title => {
                let dir = self.output_dir(scope);
                let stem = match sanitize_filename(title) {
                    s if s.is_empty() => id.to_string(),
                    s => s,
                };
                get_unique_path(dir, &stem, &self.extension)
                    .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
                    .unwrap_or_else(|| id.to_string())
            }
        }
    }

    /// Create a scoped working directory for one batch
    pub fn scoped_dir(&self, name: &str) -> Result<ScopedDir> {
        std::fs::create_dir_all(&self.root)?;
        let prefix = match sanitize_filename(name) {
            s if s.is_empty() => "batch".to_string(),
            s => s,
        };
        let inner = tempfile::Builder::new()
            .prefix(&format!("{}-", prefix))
            .tempdir_in(&self.root)
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "failed to create scoped directory: {}",
                    e
                )))
            })?;
        debug!(path = ?inner.path(), "created scoped directory");
        Ok(ScopedDir { inner })
    }

    /// Delete all but the `keep_latest` newest audio files in the temp root
    ///
    /// Only regular files with the store's extension directly inside the root
    /// are considered; scoped batch directories and archives are never
    /// touched. Returns how many files were deleted.
    pub async fn prune_oldest(&self, keep_latest: usize) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() || !self.has_audio_extension(&path) {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }

        if files.len() <= keep_latest {
            return Ok(0);
        }

        files.sort_by(|a, b| b.1.cmp(&a.1));

        let mut deleted = 0;
        for (path, _) in files.into_iter().skip(keep_latest) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(?path, "pruned old temp file");
                    deleted += 1;
                }
                Err(e) => warn!(?path, error = %e, "failed to prune temp file"),
            }
        }

        info!(deleted, keep_latest, "pruned temp root");
        Ok(deleted)
    }

    /// Remove a file, logging instead of failing
    pub async fn remove_file(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(?path, "cleaned up temp file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?path, error = %e, "failed to clean up temp file"),
        }
    }

    /// Whether `path` carries the produced-audio extension
    pub fn has_audio_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// Size of a file in bytes, 0 if it can't be read
pub async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}
