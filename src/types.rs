//! Core types for tubeaudio

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::error::Error;

/// Identifier of a single video: always an 11-character `[A-Za-z0-9_-]` token
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "dQw4w9WgXcQ")]
pub struct ItemId(String);

/// Length of every item identifier
pub const ITEM_ID_LEN: usize = 11;

// The pattern is a literal, so compilation can't fail
#[allow(clippy::unwrap_used)]
fn item_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap())
}

impl ItemId {
    /// Validate and wrap an identifier
    pub fn parse(raw: &str) -> Option<Self> {
        if item_id_pattern().is_match(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| Error::InvalidUrl(format!("not a video id: {value}")))
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

/// One finished extraction
///
/// `file_path` is owned by whoever receives the result; the caller is
/// responsible for removing it once the bytes have been consumed.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractionResult {
    /// Video identifier
    pub item_id: ItemId,
    /// Video title as reported by the source
    pub title: String,
    /// Duration in seconds, if known
    pub duration: Option<f64>,
    /// Path of the produced audio file
    #[schema(value_type = String)]
    pub file_path: PathBuf,
    /// Sanitized download filename, including extension
    pub filename: String,
}

/// Outcome of one collection entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The entry was extracted
    Success {
        /// Video identifier
        item_id: ItemId,
        /// Video title
        title: String,
        /// Filename of the produced audio file
        filename: String,
    },
    /// The entry failed after all retries
    Failure {
        /// Video identifier
        item_id: ItemId,
        /// Entry title from the collection listing
        title: String,
        /// Error message of the final attempt
        error: String,
    },
}

impl BatchOutcome {
    /// Whether this entry produced a file
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }

    /// Identifier of the entry
    pub fn item_id(&self) -> &ItemId {
        match self {
            BatchOutcome::Success { item_id, .. } | BatchOutcome::Failure { item_id, .. } => {
                item_id
            }
        }
    }
}

/// A collection packaged as a ZIP archive
#[derive(Clone, Debug)]
pub struct ArchiveResult {
    /// Collection title as reported by the source
    pub collection_title: String,
    /// One outcome per entry, in collection order
    pub outcomes: Vec<BatchOutcome>,
    /// The archive itself
    pub archive_bytes: Vec<u8>,
}

impl ArchiveResult {
    /// Number of entries that failed
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Per-entry line in a playlist report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaylistEntryReport {
    /// Whether the entry was extracted
    pub success: bool,
    /// Video identifier
    pub video_id: String,
    /// Video title (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Produced filename (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running every entry of a playlist without archiving
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaylistReport {
    /// Collection title
    pub playlist_title: String,
    /// Number of entries in the collection
    pub total_videos: usize,
    /// One line per entry, in collection order
    pub results: Vec<PlaylistEntryReport>,
}
