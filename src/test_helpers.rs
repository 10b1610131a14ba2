//! Shared fixtures for unit tests

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::config::{Config, RetryConfig};
use crate::pipeline::Extractor;
use crate::resolver;
use crate::tool::{DownloadSpec, MediaTool, RawEntry, RawInfo};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bytes of a short, valid MPEG-1 Layer III stream (128 kbps, 44.1 kHz)
pub fn mp3_bytes() -> Vec<u8> {
    const FRAME_LEN: usize = 417;
    const FRAMES: usize = 40;
    let mut data = Vec::with_capacity(FRAME_LEN * FRAMES);
    for _ in 0..FRAMES {
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        data.extend(std::iter::repeat_n(0u8, FRAME_LEN - 4));
    }
    data
}

/// PNG-encoded solid image of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 60]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// What a scripted download does
#[derive(Clone, Debug)]
pub enum Download {
    /// Write a valid MP3 at the expected path
    Mp3,
    /// Write a valid MP3 under a different name in the same directory
    Mp3Named(String),
    /// Write a zero-length file at the expected path
    Empty,
    /// Write bytes that aren't audio at the expected path
    Garbage,
    /// Exit cleanly without writing anything
    Nothing,
    /// Fail like a crashing tool
    Fail,
}

#[derive(Default)]
struct Script {
    items: HashMap<String, RawInfo>,
    playlists: HashMap<String, RawInfo>,
    downloads: HashMap<String, VecDeque<Download>>,
    download_calls: HashMap<String, u32>,
}

/// In-process [`MediaTool`] driven by a script
///
/// Known items download a valid MP3 unless a different outcome is queued
/// with [`ScriptedTool::with_downloads`]. Unknown items fail like a
/// removed video.
#[derive(Default)]
pub struct ScriptedTool {
    script: Mutex<Script>,
}

impl ScriptedTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, id: &str, title: &str) -> Self {
        let info: RawInfo = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "uploader": "Test Uploader",
            "upload_date": "20240315",
            "duration": 42.0,
        }))
        .unwrap();
        self.with_info(info)
    }

    pub fn with_info(self, info: RawInfo) -> Self {
        let id = info.id.clone().unwrap();
        self.script.lock().unwrap().items.insert(id, info);
        self
    }

    pub fn with_playlist(self, id: &str, title: &str, entries: &[(&str, &str)]) -> Self {
        let info = RawInfo {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            kind: Some("playlist".into()),
            entries: entries
                .iter()
                .map(|(id, title)| RawEntry {
                    id: Some(id.to_string()),
                    title: Some(title.to_string()),
                })
                .collect(),
            ..Default::default()
        };
        self.script
            .lock()
            .unwrap()
            .playlists
            .insert(id.to_string(), info);
        let mut tool = self;
        for (entry_id, entry_title) in entries {
            if tool.script.lock().unwrap().items.contains_key(*entry_id) {
                continue;
            }
            tool = tool.with_item(entry_id, entry_title);
        }
        tool
    }

    pub fn with_downloads(self, id: &str, outcomes: &[Download]) -> Self {
        self.script
            .lock()
            .unwrap()
            .downloads
            .insert(id.to_string(), outcomes.iter().cloned().collect());
        self
    }

    /// How many times `download_audio` ran for `id`
    pub fn download_calls(&self, id: &str) -> u32 {
        self.script
            .lock()
            .unwrap()
            .download_calls
            .get(id)
            .copied()
            .unwrap_or(0)
    }
}

fn write(path: &Path, bytes: &[u8]) -> crate::Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

#[async_trait]
impl MediaTool for ScriptedTool {
    async fn fetch_info(&self, url: &str) -> crate::Result<RawInfo> {
        let id = resolver::resolve(url)?.item_id;
        self.script
            .lock()
            .unwrap()
            .items
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| crate::Error::ExternalTool(format!("ERROR: [youtube] {id}: Video unavailable")))
    }

    async fn fetch_playlist(&self, url: &str) -> crate::Result<RawInfo> {
        if let Some(list) = resolver::collection_ref(url) {
            return self
                .script
                .lock()
                .unwrap()
                .playlists
                .get(&list)
                .cloned()
                .ok_or_else(|| {
                    crate::Error::ExternalTool(format!("ERROR: [youtube:tab] {list}: playlist does not exist"))
                });
        }
        self.fetch_info(url).await
    }

    async fn download_audio(&self, url: &str, spec: &DownloadSpec) -> crate::Result<()> {
        let id = resolver::resolve(url)?.item_id.to_string();
        let outcome = {
            let mut script = self.script.lock().unwrap();
            *script.download_calls.entry(id.clone()).or_default() += 1;
            if !script.items.contains_key(&id) {
                return Err(crate::Error::ExternalTool(format!("ERROR: [youtube] {id}: Video unavailable")));
            }
            script
                .downloads
                .get_mut(&id)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Download::Mp3)
        };

        match outcome {
            Download::Mp3 => write(&spec.expected_path(), &mp3_bytes()),
            Download::Mp3Named(name) => write(&spec.output_dir.join(name), &mp3_bytes()),
            Download::Empty => write(&spec.expected_path(), b""),
            Download::Garbage => write(&spec.expected_path(), b"<html>not audio</html>"),
            Download::Nothing => Ok(()),
            Download::Fail => Err(crate::Error::ExternalTool(
                "yt-dlp exited with exit status: 1: ERROR: unable to download".into(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Configuration for tests: temp root in `dir`, fast retries, no cover fetch
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.extraction.temp_dir = dir.to_path_buf();
    config.extraction.embed_cover = false;
    config.extraction.cover_timeout = Duration::from_secs(2);
    config.retry = RetryConfig {
        max_attempts: 3,
        delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 1.0,
        jitter: false,
    };
    config
}

/// An extractor over `tool` rooted in `dir`
pub fn test_extractor(dir: &Path, tool: Arc<ScriptedTool>) -> Extractor {
    Extractor::new(Arc::new(test_config(dir)), tool).unwrap()
}
