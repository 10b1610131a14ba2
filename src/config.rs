//! Configuration types for tubeaudio

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Top-level configuration
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid
/// configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Extraction behavior (temp directory, output format, tagging)
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Retry policy for single-item extractions
    #[serde(default)]
    pub retry: RetryConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse config file {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde can't
    pub fn validate(&self) -> Result<()> {
        if self.extraction.audio_codec.trim().is_empty() {
            return Err(Error::Config {
                message: "audio codec must not be empty".into(),
                key: Some("audio_codec".into()),
            });
        }
        if !(1..=100).contains(&self.extraction.cover_quality) {
            return Err(Error::Config {
                message: format!(
                    "cover quality must be between 1 and 100, got {}",
                    self.extraction.cover_quality
                ),
                key: Some("cover_quality".into()),
            });
        }
        Ok(())
    }

    /// Temporary directory
    pub fn temp_dir(&self) -> &PathBuf {
        &self.extraction.temp_dir
    }
}

/// External tool paths (yt-dlp, ffmpeg) and how to reach the network
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable, passed to yt-dlp (auto-detected by yt-dlp if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Proxy handed to yt-dlp (e.g. socks5://127.0.0.1:7890)
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
            proxy: None,
        }
    }
}

/// Extraction behavior
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractionConfig {
    /// Temporary directory for produced audio files (default: "temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Output codec handed to the transcoder (default: "mp3")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output quality handed to the transcoder (default: "320K")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Number of standalone outputs kept in the temp root after pruning (default: 10)
    #[serde(default = "default_keep_latest")]
    pub keep_latest: usize,

    /// Album tag used when an item is not part of a collection
    #[serde(default = "default_album")]
    pub default_album: String,

    /// Fetch and embed a cover image (default: true)
    #[serde(default = "default_true")]
    pub embed_cover: bool,

    /// JPEG quality for the embedded cover (default: 95)
    #[serde(default = "default_cover_quality")]
    pub cover_quality: u8,

    /// Timeout for downloading the cover image (default: 30 seconds)
    #[serde(default = "default_cover_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub cover_timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            audio_codec: default_audio_codec(),
            audio_quality: default_audio_quality(),
            keep_latest: default_keep_latest(),
            default_album: default_album(),
            embed_cover: true,
            cover_quality: default_cover_quality(),
            cover_timeout: default_cover_timeout(),
        }
    }
}

/// Retry behavior for a single extraction
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Total number of attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (default: 2 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub delay: Duration,

    /// Upper bound for the delay when a multiplier is used (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each attempt (default: 1.0, fixed delay)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// External server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:7783)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_audio_codec() -> String {
    "mp3".into()
}

fn default_audio_quality() -> String {
    "320K".into()
}

fn default_keep_latest() -> usize {
    10
}

fn default_album() -> String {
    "YouTube Audio".into()
}

fn default_cover_quality() -> u8 {
    95
}

fn default_cover_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 7783))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
