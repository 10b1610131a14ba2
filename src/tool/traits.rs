//! Traits and types for the media extraction tool

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// Metadata document as reported by the tool
///
/// Mirrors the subset of yt-dlp's `-J` JSON the crate reads. Every field is
/// optional; the metadata layer decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInfo {
    /// Item or collection id
    #[serde(default)]
    pub id: Option<String>,
    /// Item or collection title
    #[serde(default)]
    pub title: Option<String>,
    /// Channel/uploader name
    #[serde(default)]
    pub uploader: Option<String>,
    /// Fallback for `uploader` on some extractors
    #[serde(default)]
    pub channel: Option<String>,
    /// Upload date as `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Preferred thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// All known thumbnails, best last
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    /// Id of the collection this item was resolved through
    #[serde(default)]
    pub playlist_id: Option<String>,
    /// Title of the collection this item was resolved through
    #[serde(default)]
    pub playlist_title: Option<String>,
    /// `"playlist"` for collections, `"video"` or absent for single items
    #[serde(default, rename = "_type")]
    pub kind: Option<String>,
    /// Collection entries (flat listing)
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

impl RawInfo {
    /// Whether the document describes a collection
    pub fn is_collection(&self) -> bool {
        self.kind.as_deref() == Some("playlist")
    }
}

/// One thumbnail in a metadata document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnail {
    /// Image URL
    #[serde(default)]
    pub url: Option<String>,
}

/// One entry of a flat collection listing
///
/// Deleted or private entries come back with placeholder ids or nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    /// Entry id
    #[serde(default)]
    pub id: Option<String>,
    /// Entry title
    #[serde(default)]
    pub title: Option<String>,
}

/// Options for one download/transcode invocation
///
/// Built fresh for every call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    /// Directory the output lands in
    pub output_dir: PathBuf,
    /// Output basename without extension
    pub basename: String,
    /// Source format selector
    pub format: String,
    /// Target audio codec, also the produced file's extension
    pub codec: String,
    /// Target audio quality
    pub quality: String,
}

impl DownloadSpec {
    /// Output template handed to the tool, `<dir>/<basename>.%(ext)s`
    pub fn output_template(&self) -> String {
        self.output_dir
            .join(format!("{}.%(ext)s", self.basename))
            .to_string_lossy()
            .into_owned()
    }

    /// Where the tool is expected to leave the transcoded file
    pub fn expected_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.basename, self.codec))
    }
}

/// External capability that fetches metadata and produces audio files
///
/// Implementations run out of process (yt-dlp driving ffmpeg) or stand in
/// for it in tests. Every method must be safe to call concurrently.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Fetch metadata for a single item without downloading media
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalTool`] if the tool can't run or
    /// exits with failure, [`crate::Error::Serialization`] if its output
    /// isn't valid JSON.
    async fn fetch_info(&self, url: &str) -> crate::Result<RawInfo>;

    /// Fetch a flat listing of a collection without downloading media
    async fn fetch_playlist(&self, url: &str) -> crate::Result<RawInfo>;

    /// Download the best audio stream of `url` and transcode it per `spec`
    ///
    /// Success only means the tool exited cleanly; callers must locate and
    /// check the produced file themselves.
    async fn download_audio(&self, url: &str, spec: &DownloadSpec) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
