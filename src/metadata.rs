//! Item and collection metadata
//!
//! Everything here is metadata only; nothing is downloaded. Any tool or
//! parse failure becomes [`Error::MetadataUnavailable`], which the retry
//! policy treats as final.

use crate::error::{Error, Result};
use crate::tool::{MediaTool, RawInfo};
use crate::types::ItemId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata of a single item
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Item id
    pub id: ItemId,
    /// Item title
    pub title: String,
    /// Channel or uploader name
    pub uploader: Option<String>,
    /// Upload date as `YYYYMMDD`
    pub upload_date: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Cover image URLs to try, best first
    pub thumbnail_candidates: Vec<String>,
    /// Id of the collection the item was reached through
    pub collection_id: Option<String>,
    /// Title of the collection the item was reached through
    pub collection_title: Option<String>,
}

/// One entry of a collection listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionEntry {
    /// Entry id
    pub id: ItemId,
    /// Entry title, possibly empty
    pub title: String,
}

/// An ordered list of items
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    /// Collection id (the item id for a one-entry pseudo-collection)
    pub id: String,
    /// Collection title
    pub title: String,
    /// Entries in source order
    pub entries: Vec<CollectionEntry>,
}

/// Fetches metadata through a [`MediaTool`]
#[derive(Clone)]
pub struct MetadataFetcher {
    tool: Arc<dyn MediaTool>,
}

impl MetadataFetcher {
    /// Create a fetcher backed by `tool`
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self { tool }
    }

    /// Fetch metadata for one item
    pub async fn fetch_item(&self, url: &str) -> Result<Item> {
        let info = self
            .tool
            .fetch_info(url)
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;
        let item = item_from_info(info)?;
        debug!(item_id = %item.id, title = %item.title, "fetched item metadata");
        Ok(item)
    }

    /// Fetch the flat listing of a collection
    ///
    /// A URL that names a single item comes back as a one-entry collection.
    /// Entries without a valid id (deleted or private videos) are dropped.
    pub async fn fetch_collection(&self, url: &str) -> Result<Collection> {
        let info = self
            .tool
            .fetch_playlist(url)
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;
        let collection = collection_from_info(info)?;
        debug!(
            collection_id = %collection.id,
            entries = collection.entries.len(),
            "fetched collection metadata"
        );
        Ok(collection)
    }
}

fn item_from_info(info: RawInfo) -> Result<Item> {
    let id = info
        .id
        .as_deref()
        .and_then(ItemId::parse)
        .ok_or_else(|| Error::MetadataUnavailable("could not extract video id".into()))?;

    let thumbnail_candidates = thumbnail_candidates(&id, &info);
    let title = non_empty(info.title).unwrap_or_else(|| id.to_string());

    Ok(Item {
        title,
        uploader: non_empty(info.uploader).or_else(|| non_empty(info.channel)),
        upload_date: non_empty(info.upload_date),
        duration: info.duration,
        thumbnail_candidates,
        collection_id: non_empty(info.playlist_id),
        collection_title: non_empty(info.playlist_title),
        id,
    })
}

fn collection_from_info(info: RawInfo) -> Result<Collection> {
    if !info.is_collection() {
        let item = item_from_info(info)?;
        return Ok(Collection {
            id: item.id.to_string(),
            title: item.title.clone(),
            entries: vec![CollectionEntry {
                id: item.id,
                title: item.title,
            }],
        });
    }

    let id = non_empty(info.id).unwrap_or_default();
    let title = non_empty(info.title).unwrap_or_else(|| "playlist".to_string());

    let entries = info
        .entries
        .into_iter()
        .filter_map(|entry| {
            match entry.id.as_deref().and_then(ItemId::parse) {
                Some(entry_id) => Some(CollectionEntry {
                    id: entry_id,
                    title: entry.title.unwrap_or_default(),
                }),
                None => {
                    warn!(
                        collection = %title,
                        id = ?entry.id,
                        "skipping collection entry without a valid video id"
                    );
                    None
                }
            }
        })
        .collect();

    Ok(Collection { id, title, entries })
}

/// Cover candidates: explicit thumbnail, first listed thumbnail, then the
/// well-known image URLs for the id
fn thumbnail_candidates(id: &ItemId, info: &RawInfo) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !url.is_empty() && !candidates.contains(&url) {
            candidates.push(url);
        }
    };

    if let Some(thumbnail) = &info.thumbnail {
        push(thumbnail.clone());
    }
    if let Some(url) = info
        .thumbnails
        .iter()
        .find_map(|t| non_empty(t.url.clone()))
    {
        push(url);
    }
    push(format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id));
    push(format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id));

    candidates
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
