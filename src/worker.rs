//! Download/transcode step
//!
//! Hands a fresh [`DownloadSpec`] to the media tool, then finds the file it
//! produced. The tool is expected to write `<dir>/<basename>.<codec>`, but
//! some sources end up with a different name after post-processing, so the
//! worker falls back to the newest audio file that appeared in the output
//! directory during the call.

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::temp_files::file_size;
use crate::tool::{DownloadSpec, MediaTool};
use crate::types::ItemId;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Source format selector: best audio-only stream, else best muxed stream
pub const SOURCE_FORMAT: &str = "bestaudio/best";

/// Runs the media tool and locates its output
#[derive(Clone)]
pub struct DownloadWorker {
    tool: Arc<dyn MediaTool>,
    codec: String,
    quality: String,
}

impl DownloadWorker {
    /// Create a worker producing `config.audio_codec` at `config.audio_quality`
    pub fn new(tool: Arc<dyn MediaTool>, config: &ExtractionConfig) -> Self {
        Self {
            tool,
            codec: config.audio_codec.clone(),
            quality: config.audio_quality.clone(),
        }
    }

    /// Build the options for one invocation
    pub fn spec_for(&self, output_dir: &Path, basename: &str) -> DownloadSpec {
        DownloadSpec {
            output_dir: output_dir.to_path_buf(),
            basename: basename.to_string(),
            format: SOURCE_FORMAT.to_string(),
            codec: self.codec.clone(),
            quality: self.quality.clone(),
        }
    }

    /// Download and transcode `source_url` into `output_dir`
    ///
    /// Returns the path of the produced, non-empty file.
    ///
    /// # Errors
    ///
    /// Tool failures are passed through ([`Error::ExternalTool`]). A clean
    /// exit with no usable file is [`Error::ConversionFailed`].
    pub async fn download(
        &self,
        item_id: &ItemId,
        source_url: &str,
        output_dir: &Path,
        basename: &str,
    ) -> Result<PathBuf> {
        let spec = self.spec_for(output_dir, basename);
        let before = list_audio_files(output_dir, &spec.codec).await;
        let started = SystemTime::now();

        info!(%item_id, tool = self.tool.name(), dir = ?output_dir, basename, "downloading audio");
        self.tool.download_audio(source_url, &spec).await?;

        let path = self.locate_output(&spec, &before).await.ok_or_else(|| {
            Error::ConversionFailed(format!(
                "no {} file produced for {}",
                spec.codec, item_id
            ))
        })?;

        let size = file_size(&path).await;
        if size == 0 {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(?path, error = %e, "failed to remove empty output");
            }
            return Err(Error::ConversionFailed(format!(
                "empty {} file produced for {}",
                spec.codec, item_id
            )));
        }

        debug!(
            %item_id,
            ?path,
            size,
            elapsed_ms = started.elapsed().map(|d| d.as_millis()).unwrap_or(0),
            "audio ready"
        );
        Ok(path)
    }

    /// Expected path if present, else the newest new audio file
    async fn locate_output(&self, spec: &DownloadSpec, before: &HashSet<PathBuf>) -> Option<PathBuf> {
        let expected = spec.expected_path();
        if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Some(expected);
        }

        let mut fresh: Vec<(bool, SystemTime, PathBuf)> = Vec::new();
        for path in list_audio_files(&spec.output_dir, &spec.codec).await {
            if before.contains(&path) {
                continue;
            }
            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let ours = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with(spec.basename.as_str()))
                .unwrap_or(false);
            fresh.push((ours, modified, path));
        }

        let (_, _, path) = fresh.into_iter().max_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))?;
        warn!(expected = ?expected, found = ?path, "output not at expected path, using newest new file");
        Some(path)
    }
}

/// Regular files in `dir` with extension `ext`
async fn list_audio_files(dir: &Path, ext: &str) -> HashSet<PathBuf> {
    let mut found = HashSet::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return found;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let matches_ext = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if is_file && matches_ext {
            found.insert(path);
        }
    }
    found
}
