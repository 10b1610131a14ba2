//! Collection extraction
//!
//! Drives the single-item pipeline over every entry of a collection, in
//! source order, recording a [`BatchOutcome`] per entry. One entry failing
//! never stops the rest.
//!
//! [`Extractor::extract_collection`] writes into a scoped directory and
//! packages the successes into a ZIP archive; the directory is gone by the
//! time it returns, on every path. [`Extractor::report_collection`] runs the
//! same loop as standalone extractions and only reports the outcomes.

pub mod archive;

use crate::error::{Error, Result};
use crate::pipeline::Extractor;
use crate::resolver::watch_url;
use crate::temp_files::OutputScope;
use crate::types::{ArchiveResult, BatchOutcome, PlaylistEntryReport, PlaylistReport};
use crate::utils::sanitize_filename;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Title used when a collection's title sanitizes to nothing
const FALLBACK_TITLE: &str = "playlist";

impl Extractor {
    /// Extract every entry of a collection into one archive
    ///
    /// # Errors
    ///
    /// [`Error::MetadataUnavailable`] if the collection can't be listed or
    /// has no usable entries, [`Error::Archive`] if packaging fails or no
    /// entry could be extracted. Individual entry failures are reported in
    /// [`ArchiveResult::outcomes`] instead.
    pub async fn extract_collection(&self, url: &str) -> Result<ArchiveResult> {
        let collection = self.fetcher.fetch_collection(url).await?;
        if collection.entries.is_empty() {
            return Err(Error::MetadataUnavailable(format!(
                "collection '{}' has no available entries",
                collection.title
            )));
        }

        let safe_title = match sanitize_filename(&collection.title) {
            s if s.is_empty() => FALLBACK_TITLE.to_string(),
            s => s,
        };
        info!(
            collection = %collection.title,
            entries = collection.entries.len(),
            "extracting collection"
        );

        self.temp.ensure_root().await?;
        let scoped = self.temp.scoped_dir(&safe_title)?;
        let scope = OutputScope::Batch {
            dir: scoped.path().to_path_buf(),
            collection_title: collection.title.clone(),
        };

        let total = collection.entries.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut produced: Vec<PathBuf> = Vec::new();

        for (index, entry) in collection.entries.iter().enumerate() {
            info!(
                item_id = %entry.id,
                position = index + 1,
                total,
                title = %entry.title,
                "processing collection entry"
            );
            match self.extract(&watch_url(&entry.id), &scope).await {
                Ok(result) => {
                    produced.push(result.file_path);
                    outcomes.push(BatchOutcome::Success {
                        item_id: result.item_id,
                        title: result.title,
                        filename: result.filename,
                    });
                }
                Err(e) => {
                    warn!(item_id = %entry.id, error = %e, "collection entry failed");
                    outcomes.push(BatchOutcome::Failure {
                        item_id: entry.id.clone(),
                        title: entry.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if produced.is_empty() {
            return Err(Error::Archive(format!(
                "none of the {} entries in '{}' could be extracted",
                total, collection.title
            )));
        }

        let zip_path = self.temp.root().join(format!("{}.zip", scoped.name()));
        let extension = self.temp.extension().to_string();
        let archive_bytes = tokio::task::spawn_blocking(move || {
            archive::build_archive(&zip_path, &produced, &extension)
        })
        .await
        .map_err(|e| Error::Archive(format!("archive task failed: {}", e)))??;

        drop(scoped);

        let result = ArchiveResult {
            collection_title: collection.title,
            outcomes,
            archive_bytes,
        };
        info!(
            collection = %result.collection_title,
            failed = result.failure_count(),
            total,
            size = result.archive_bytes.len(),
            "collection archived"
        );
        Ok(result)
    }

    /// Extract every entry of a collection and report the outcomes
    ///
    /// Produced files are removed as soon as they are recorded.
    ///
    /// # Errors
    ///
    /// [`Error::MetadataUnavailable`] if the collection can't be listed,
    /// [`Error::Io`] if the temp root can't be created. Entry failures are
    /// reported per entry.
    pub async fn report_collection(&self, url: &str) -> Result<PlaylistReport> {
        let collection = self.fetcher.fetch_collection(url).await?;
        let total = collection.entries.len();
        info!(collection = %collection.title, entries = total, "processing playlist");
        self.temp.ensure_root().await?;

        let mut results = Vec::with_capacity(total);
        for entry in &collection.entries {
            match self
                .extract(&watch_url(&entry.id), &OutputScope::Standalone)
                .await
            {
                Ok(result) => {
                    self.temp.remove_file(&result.file_path).await;
                    results.push(PlaylistEntryReport {
                        success: true,
                        video_id: result.item_id.to_string(),
                        title: Some(result.title),
                        filename: Some(result.filename),
                        error: None,
                    });
                }
                Err(e) => {
                    error!(item_id = %entry.id, error = %e, "playlist entry failed");
                    results.push(PlaylistEntryReport {
                        success: false,
                        video_id: entry.id.to_string(),
                        title: (!entry.title.is_empty()).then(|| entry.title.clone()),
                        filename: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(PlaylistReport {
            playlist_title: collection.title,
            total_videos: total,
            results,
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{Download, ScriptedTool, test_extractor};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::tempdir;

    const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLroadtrip";

    fn three_entry_tool() -> ScriptedTool {
        ScriptedTool::new()
            .with_playlist(
                "PLroadtrip",
                "Road Trip: 2024",
                &[
                    ("aaaaaaaaaaa", "Alpha"),
                    ("bbbbbbbbbbb", "Bravo"),
                    ("ccccccccccc", "Charlie"),
                ],
            )
            .with_downloads(
                "bbbbbbbbbbb",
                &[Download::Fail, Download::Fail, Download::Fail],
            )
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn failing_entry_is_isolated() {
        let dir = tempdir().unwrap();
        let tool = Arc::new(three_entry_tool());
        let extractor = test_extractor(dir.path(), tool.clone());

        let result = extractor.extract_collection(PLAYLIST_URL).await.unwrap();

        assert_eq!(result.collection_title, "Road Trip: 2024");
        assert_eq!(result.outcomes.len(), 3);
        assert!(result.outcomes[0].is_success());
        assert!(!result.outcomes[1].is_success());
        assert!(result.outcomes[2].is_success());
        assert_eq!(result.outcomes[1].item_id().as_str(), "bbbbbbbbbbb");
        assert_eq!(result.failure_count(), 1);
        assert_eq!(
            entry_names(&result.archive_bytes),
            vec!["Alpha.mp3", "Charlie.mp3"]
        );
        assert_eq!(tool.download_calls("bbbbbbbbbbb"), 3);
        assert_eq!(tool.download_calls("ccccccccccc"), 1);
    }

    #[tokio::test]
    async fn scoped_directory_and_archive_are_removed() {
        let dir = tempdir().unwrap();
        let extractor = test_extractor(dir.path(), Arc::new(three_entry_tool()));

        extractor.extract_collection(PLAYLIST_URL).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temp root not empty: {leftovers:?}");
    }

    #[tokio::test]
    async fn failure_outcome_carries_final_error() {
        let dir = tempdir().unwrap();
        let extractor = test_extractor(dir.path(), Arc::new(three_entry_tool()));

        let result = extractor.extract_collection(PLAYLIST_URL).await.unwrap();

        match &result.outcomes[1] {
            BatchOutcome::Failure { title, error, .. } => {
                assert_eq!(title, "Bravo");
                assert!(error.contains("unable to download"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_titles_get_distinct_entries() {
        let dir = tempdir().unwrap();
        let tool = ScriptedTool::new().with_playlist(
            "PLdupes",
            "Dupes",
            &[("aaaaaaaaaaa", "Same"), ("bbbbbbbbbbb", "Same")],
        );
        let extractor = test_extractor(dir.path(), Arc::new(tool));

        let result = extractor
            .extract_collection("https://www.youtube.com/playlist?list=PLdupes")
            .await
            .unwrap();

        assert_eq!(
            entry_names(&result.archive_bytes),
            vec!["Same.mp3", "Same_1.mp3"]
        );
    }

    #[tokio::test]
    async fn all_entries_failing_is_an_archive_error() {
        let dir = tempdir().unwrap();
        let tool = ScriptedTool::new()
            .with_playlist("PLbad", "Bad", &[("aaaaaaaaaaa", "A")])
            .with_downloads(
                "aaaaaaaaaaa",
                &[Download::Nothing, Download::Nothing, Download::Nothing],
            );
        let extractor = test_extractor(dir.path(), Arc::new(tool));

        let err = extractor
            .extract_collection("https://www.youtube.com/playlist?list=PLbad")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unknown_collection_is_metadata_unavailable() {
        let dir = tempdir().unwrap();
        let extractor = test_extractor(dir.path(), Arc::new(ScriptedTool::new()));

        let err = extractor
            .extract_collection("https://www.youtube.com/playlist?list=PLmissing")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn report_lists_every_entry_and_leaves_no_files() {
        let dir = tempdir().unwrap();
        let extractor = test_extractor(dir.path(), Arc::new(three_entry_tool()));

        let report = extractor.report_collection(PLAYLIST_URL).await.unwrap();

        assert_eq!(report.playlist_title, "Road Trip: 2024");
        assert_eq!(report.total_videos, 3);
        let flags: Vec<bool> = report.results.iter().map(|r| r.success).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(report.results[0].filename.as_deref(), Some("Alpha.mp3"));
        assert_eq!(report.results[1].video_id, "bbbbbbbbbbb");
        assert!(report.results[1].error.is_some());

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn report_fails_when_temp_root_is_unusable() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"occupied").unwrap();
        let extractor = test_extractor(&root, Arc::new(three_entry_tool()));

        let err = extractor.report_collection(PLAYLIST_URL).await.unwrap_err();

        assert!(matches!(err, Error::Io(_)), "got {err:?}");
    }
}
