//! Source URL resolution
//!
//! Turns whatever the user pasted (canonical watch URLs, short links, share
//! links with tracking parameters, shorts/embed/live paths) into the
//! 11-character item id, and tells whether the URL also names a collection.

use crate::error::{Error, Result};
use crate::types::ItemId;
use url::Url;

/// Outcome of resolving a source URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// The item the URL points at
    pub item_id: ItemId,
    /// Whether the URL also references a real collection (not a generated mix)
    pub is_collection_ref: bool,
}

/// Path prefixes that carry the id as the next segment
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "live", "v", "e"];

/// Resolve a URL to its item id
///
/// Scheme-less input (`youtu.be/ID`, `www.youtube.com/watch?v=ID`) is
/// accepted. The `v` query parameter wins over any id in the path.
pub fn resolve(raw: &str) -> Result<ResolvedUrl> {
    let url = parse_source_url(raw)?;
    let item_id = item_id_of(&url)
        .ok_or_else(|| Error::InvalidUrl(format!("no video id found in {}", raw.trim())))?;

    Ok(ResolvedUrl {
        item_id,
        is_collection_ref: list_param(&url).is_some_and(|list| !is_generated_mix(&list)),
    })
}

/// The collection id referenced by a URL, if any
///
/// Works for pure collection URLs (`/playlist?list=PL...`) that carry no item
/// id. Generated mixes (`RD...`) don't count as collections.
pub fn collection_ref(raw: &str) -> Option<String> {
    let url = parse_source_url(raw).ok()?;
    list_param(&url).filter(|list| !is_generated_mix(list))
}

/// Canonical watch URL for an item
pub fn watch_url(id: &ItemId) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn parse_source_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            trimmed
        )));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !is_supported_host(&host) {
        return Err(Error::InvalidUrl(format!("not a YouTube URL: {}", trimmed)));
    }

    Ok(url)
}

fn is_supported_host(host: &str) -> bool {
    host == "youtu.be"
        || host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com")
}

fn item_id_of(url: &Url) -> Option<ItemId> {
    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .and_then(|(_, value)| ItemId::parse(&value))
    {
        return Some(id);
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;

    if url.host_str().is_some_and(|h| h.eq_ignore_ascii_case("youtu.be")) {
        return ItemId::parse(first);
    }

    if ID_PATH_PREFIXES.contains(&first) {
        return segments.next().and_then(ItemId::parse);
    }

    None
}

fn list_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn is_generated_mix(list: &str) -> bool {
    list.starts_with("RD")
}
