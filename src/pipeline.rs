//! Single-item extraction pipeline
//!
//! resolve → metadata → download/transcode → tags → verify, wrapped in the
//! retry policy. A file produced by a failed attempt is removed before the
//! error leaves the attempt, so retries and abandoned calls don't pile up
//! half-finished outputs.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{Item, MetadataFetcher};
use crate::resolver;
use crate::retry::with_retry;
use crate::tagging::TagWriter;
use crate::temp_files::{OutputScope, TempStore};
use crate::tool::MediaTool;
use crate::types::ExtractionResult;
use crate::utils::sanitize_filename;
use crate::worker::DownloadWorker;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs extractions against one temp root
///
/// Cheap to clone; all clones share the tool and HTTP client.
#[derive(Clone)]
pub struct Extractor {
    pub(crate) config: Arc<Config>,
    pub(crate) fetcher: MetadataFetcher,
    pub(crate) worker: DownloadWorker,
    pub(crate) tagger: TagWriter,
    pub(crate) temp: TempStore,
}

impl Extractor {
    /// Build an extractor from configuration and a media tool
    pub fn new(config: Arc<Config>, tool: Arc<dyn MediaTool>) -> Result<Self> {
        config.validate()?;
        let extraction = &config.extraction;
        Ok(Self {
            fetcher: MetadataFetcher::new(tool.clone()),
            worker: DownloadWorker::new(tool, extraction),
            tagger: TagWriter::new(extraction)?,
            temp: TempStore::new(extraction.temp_dir.clone(), extraction.audio_codec.clone()),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The temp store outputs are written to
    pub fn temp_store(&self) -> &TempStore {
        &self.temp
    }

    /// Extract one item as a tagged audio file
    ///
    /// The caller owns the returned file and should remove it once consumed
    /// (see [`TempStore::remove_file`]). Standalone successes also prune the
    /// temp root down to the configured number of recent files.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] and [`Error::MetadataUnavailable`] are returned
    /// immediately. Download, conversion and verification failures are
    /// retried; the final attempt's error is returned unchanged.
    pub async fn extract(&self, url: &str, scope: &OutputScope) -> Result<ExtractionResult> {
        resolver::resolve(url)?;
        self.temp.ensure_root().await?;

        let result = with_retry(&self.config.retry, || self.attempt(url, scope)).await?;

        info!(
            item_id = %result.item_id,
            title = %result.title,
            path = ?result.file_path,
            "extraction complete"
        );

        if scope.is_standalone() {
            // The fresh output is the newest file, so keeping at least one spares it
            let keep = self.config.extraction.keep_latest.max(1);
            if let Err(e) = self.temp.prune_oldest(keep).await {
                warn!(error = %e, "pruning temp root failed");
            }
        }

        Ok(result)
    }

    async fn attempt(&self, url: &str, scope: &OutputScope) -> Result<ExtractionResult> {
        let mut item = self.fetcher.fetch_item(url).await?;
        if let OutputScope::Batch {
            collection_title, ..
        } = scope
        {
            item.collection_title = Some(collection_title.clone());
        }

        let dir = self.temp.output_dir(scope);
        let basename = self.temp.reserve_basename(scope, &item.id, &item.title);
        let path = self
            .worker
            .download(&item.id, &resolver::watch_url(&item.id), dir, &basename)
            .await?;

        match self.finish(&path, &item, scope).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.temp.remove_file(&path).await;
                Err(e)
            }
        }
    }

    async fn finish(&self, path: &Path, item: &Item, scope: &OutputScope) -> Result<ExtractionResult> {
        match self.tagger.apply_tags(path, item).await {
            Ok(report) => debug!(item_id = %item.id, ?report, "tagging finished"),
            Err(e) => warn!(item_id = %item.id, error = %e, "tagging failed, keeping untagged file"),
        }

        verify_audio(path.to_path_buf()).await?;

        let filename = match scope {
            OutputScope::Standalone => {
                let stem = match sanitize_filename(&item.title) {
                    s if s.is_empty() => item.id.to_string(),
                    s => s,
                };
                format!("{}.{}", stem, self.temp.extension())
            }
            OutputScope::Batch { .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.{}", item.id, self.temp.extension())),
        };

        Ok(ExtractionResult {
            item_id: item.id.clone(),
            title: item.title.clone(),
            duration: item.duration,
            file_path: path.to_path_buf(),
            filename,
        })
    }
}

/// Re-open a produced file and check that it parses as audio
pub async fn verify_audio(path: PathBuf) -> Result<()> {
    let checked = path.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        Probe::open(&checked)
            .and_then(|probe| probe.read())
            .map(|tagged| tagged.properties().duration())
    })
    .await
    .map_err(|e| Error::Other(format!("verification task failed: {}", e)))?;

    match outcome {
        Ok(duration) => {
            debug!(?path, duration_ms = duration.as_millis(), "verified audio file");
            Ok(())
        }
        Err(e) => Err(Error::VerificationFailed {
            path,
            reason: e.to_string(),
        }),
    }
}
