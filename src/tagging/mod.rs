//! ID3 tags and cover art
//!
//! Tagging is best-effort. [`TagWriter::apply_tags`] reports what it managed
//! to do through [`TagReport`] or a [`TagError`], and the pipeline only logs
//! either. A file with partial or missing tags is still a valid result.
//!
//! Every write clears existing pictures before adding the cover, so a file
//! carries at most one cover frame no matter how often it is tagged.

pub mod cover;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result, TagError};
use crate::metadata::Item;
use crate::utils::year_from_upload_date;
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// What a tagging run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReport {
    /// Title written to the file
    pub title: String,
    /// Album written to the file
    pub album: String,
    /// Whether a cover frame was embedded
    pub cover_embedded: bool,
    /// Why the cover was skipped, if it was attempted and failed
    pub cover_error: Option<String>,
}

/// Text frames for one file
#[derive(Debug, Clone)]
struct TagFields {
    title: String,
    artist: Option<String>,
    album: String,
    year: Option<u32>,
}

/// Writes tags and covers into produced audio files
#[derive(Clone)]
pub struct TagWriter {
    http: reqwest::Client,
    default_album: String,
    embed_cover: bool,
    cover_quality: u8,
    cover_timeout: Duration,
}

impl TagWriter {
    /// Create a tag writer from extraction settings
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.cover_timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            http,
            default_album: config.default_album.clone(),
            embed_cover: config.embed_cover,
            cover_quality: config.cover_quality,
            cover_timeout: config.cover_timeout,
        })
    }

    /// Tag `path` with `item`'s metadata and cover
    ///
    /// Sets title, artist (uploader), album (collection title, else the
    /// configured default) and year. A cover problem doesn't stop the text
    /// frames from being written; it shows up in [`TagReport::cover_error`].
    pub async fn apply_tags(&self, path: &Path, item: &Item) -> std::result::Result<TagReport, TagError> {
        let fields = TagFields {
            title: item.title.clone(),
            artist: item.uploader.clone(),
            album: item
                .collection_title
                .clone()
                .unwrap_or_else(|| self.default_album.clone()),
            year: item.upload_date.as_deref().and_then(year_from_upload_date),
        };

        let (cover, cover_error) = if self.embed_cover {
            match self.cover_for(item).await {
                Ok(jpeg) => (Some(jpeg), None),
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "cover unavailable, tagging without it");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        let report = TagReport {
            title: fields.title.clone(),
            album: fields.album.clone(),
            cover_embedded: cover.is_some(),
            cover_error,
        };

        let owned_path = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_tags(&owned_path, &fields, cover))
            .await
            .map_err(|e| TagError::Aborted(e.to_string()))??;

        debug!(item_id = %item.id, ?path, cover = report.cover_embedded, "tags written");
        Ok(report)
    }

    /// Turn the first usable cover candidate into a square JPEG
    ///
    /// Candidates are tried in order; a failed fetch or an undecodable image
    /// moves on to the next one. The last failure is returned.
    async fn cover_for(&self, item: &Item) -> std::result::Result<Vec<u8>, TagError> {
        let mut last_error = TagError::CoverFetch {
            url: String::new(),
            reason: "no thumbnail candidates".into(),
        };

        for url in item
            .thumbnail_candidates
            .iter()
            .filter(|u| !u.trim().is_empty())
        {
            match self.cover_from(url).await {
                Ok(jpeg) => return Ok(jpeg),
                Err(e) => {
                    debug!(item_id = %item.id, %url, error = %e, "cover candidate failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn cover_from(&self, url: &str) -> std::result::Result<Vec<u8>, TagError> {
        let bytes = self.fetch_image(url).await?;
        let quality = self.cover_quality;
        tokio::task::spawn_blocking(move || cover::prepare_cover(&bytes, quality))
            .await
            .map_err(|e| TagError::Aborted(e.to_string()))?
    }

    async fn fetch_image(&self, url: &str) -> std::result::Result<Vec<u8>, TagError> {
        let fetch_error = |reason: String| TagError::CoverFetch {
            url: url.to_string(),
            reason,
        };

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                fetch_error(format!(
                    "timed out after {} seconds",
                    self.cover_timeout.as_secs()
                ))
            } else {
                fetch_error(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(format!("failed to read body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// Write text frames and the optional cover into the file's ID3v2 tag
fn write_tags(
    path: &Path,
    fields: &TagFields,
    cover: Option<Vec<u8>>,
) -> std::result::Result<(), TagError> {
    let write_error = |reason: String| TagError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let mut tagged = Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| write_error(e.to_string()))?;

    if tagged.tag(TagType::Id3v2).is_none() {
        tagged.insert_tag(Tag::new(TagType::Id3v2));
    }
    let tag = tagged
        .tag_mut(TagType::Id3v2)
        .ok_or_else(|| write_error("file does not support ID3v2 tags".into()))?;

    tag.set_title(fields.title.clone());
    tag.set_album(fields.album.clone());
    if let Some(artist) = &fields.artist {
        tag.set_artist(artist.clone());
    }
    if let Some(year) = fields.year {
        tag.set_year(year);
    }

    if let Some(jpeg) = cover {
        while !tag.pictures().is_empty() {
            tag.remove_picture(0);
        }
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            jpeg,
        ));
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| write_error(e.to_string()))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mp3_bytes, png_bytes};
    use crate::types::ItemId;
    use image::GenericImageView;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(thumbnails: Vec<String>) -> Item {
        Item {
            id: ItemId::parse("dQw4w9WgXcQ").unwrap(),
            title: "Never Gonna Give You Up".into(),
            uploader: Some("Rick Astley".into()),
            upload_date: Some("20091025".into()),
            duration: Some(212.0),
            thumbnail_candidates: thumbnails,
            collection_id: None,
            collection_title: None,
        }
    }

    fn writer() -> TagWriter {
        let config = ExtractionConfig {
            cover_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        TagWriter::new(&config).unwrap()
    }

    fn read_id3(path: &Path) -> Tag {
        let tagged = Probe::open(path).unwrap().read().unwrap();
        tagged.tag(TagType::Id3v2).cloned().unwrap()
    }

    async fn cover_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vi/dQw4w9WgXcQ/maxresdefault.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(320, 180)))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn writes_text_frames_and_square_cover() {
        let server = cover_server().await;
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, mp3_bytes()).unwrap();

        let report = writer()
            .apply_tags(
                &file,
                &item(vec![format!("{}/vi/dQw4w9WgXcQ/maxresdefault.jpg", server.uri())]),
            )
            .await
            .unwrap();

        assert!(report.cover_embedded);
        assert_eq!(report.album, "YouTube Audio");

        let tag = read_id3(&file);
        assert_eq!(tag.title().as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(tag.artist().as_deref(), Some("Rick Astley"));
        assert_eq!(tag.album().as_deref(), Some("YouTube Audio"));
        assert_eq!(tag.year(), Some(2009));
        assert_eq!(tag.pictures().len(), 1);

        let picture = &tag.pictures()[0];
        assert_eq!(picture.pic_type(), PictureType::CoverFront);
        let cover = image::load_from_memory(picture.data()).unwrap();
        assert_eq!(cover.dimensions(), (180, 180));
    }

    #[tokio::test]
    async fn falls_through_to_next_candidate_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vi/dQw4w9WgXcQ/maxresdefault.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vi/dQw4w9WgXcQ/hqdefault.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(480, 360)))
            .mount(&server)
            .await;
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, mp3_bytes()).unwrap();

        let report = writer()
            .apply_tags(
                &file,
                &item(vec![
                    format!("{}/vi/dQw4w9WgXcQ/maxresdefault.jpg", server.uri()),
                    format!("{}/vi/dQw4w9WgXcQ/hqdefault.jpg", server.uri()),
                ]),
            )
            .await
            .unwrap();

        assert!(report.cover_embedded);
        assert!(report.cover_error.is_none());
        let tag = read_id3(&file);
        let cover = image::load_from_memory(tag.pictures()[0].data()).unwrap();
        assert_eq!(cover.dimensions(), (360, 360));
    }

    #[tokio::test]
    async fn retagging_keeps_a_single_cover() {
        let server = cover_server().await;
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, mp3_bytes()).unwrap();
        let item = item(vec![format!("{}/vi/dQw4w9WgXcQ/maxresdefault.jpg", server.uri())]);

        let writer = writer();
        writer.apply_tags(&file, &item).await.unwrap();
        writer.apply_tags(&file, &item).await.unwrap();

        assert_eq!(read_id3(&file).pictures().len(), 1);
    }

    #[tokio::test]
    async fn collection_title_becomes_album() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, mp3_bytes()).unwrap();
        let mut item = item(Vec::new());
        item.collection_title = Some("Road Trip".into());

        let report = writer().apply_tags(&file, &item).await.unwrap();

        assert!(!report.cover_embedded);
        assert_eq!(read_id3(&file).album().as_deref(), Some("Road Trip"));
    }

    #[tokio::test]
    async fn cover_failure_still_writes_text_frames() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, mp3_bytes()).unwrap();

        let report = writer()
            .apply_tags(&file, &item(vec![format!("{}/missing.jpg", server.uri())]))
            .await
            .unwrap();

        assert!(!report.cover_embedded);
        assert!(report.cover_error.unwrap().contains("404"));
        let tag = read_id3(&file);
        assert_eq!(tag.title().as_deref(), Some("Never Gonna Give You Up"));
        assert!(tag.pictures().is_empty());
    }

    #[tokio::test]
    async fn non_audio_file_is_a_write_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("broken.mp3");
        std::fs::write(&file, b"definitely not audio").unwrap();

        let err = writer().apply_tags(&file, &item(Vec::new())).await.unwrap_err();
        assert!(matches!(err, TagError::Write { .. }));
    }
}
