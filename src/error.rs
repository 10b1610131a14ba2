//! Error types for tubeaudio
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error variants (invalid URL, metadata, conversion, archive)
//! - HTTP status code mapping for API integration
//! - A separate, never-propagated error type for best-effort tagging

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for tubeaudio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tubeaudio
///
/// Every variant's `Display` text is what API clients see in the `detail`
/// field, so messages are written for humans and never include backtraces.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL does not carry a resolvable 11-character item identifier
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Item or collection metadata could not be retrieved
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The download/transcode step produced no file or an empty file
    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    /// The produced file does not parse as a valid audio container
    #[error("verification failed for {path}: {reason}")]
    VerificationFailed {
        /// The file that failed verification
        path: PathBuf,
        /// Why the container could not be read
        reason: String,
    },

    /// Building the collection archive failed
    #[error("archive failed: {0}")]
    Archive(String),

    /// External tool execution failed (yt-dlp, ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Tagging errors
///
/// Tagging is best-effort: these errors are logged by the pipeline and never
/// converted into [`Error`], so a tagging problem can't fail an extraction.
#[derive(Debug, Error)]
pub enum TagError {
    /// Cover image could not be downloaded
    #[error("cover fetch failed for {url}: {reason}")]
    CoverFetch {
        /// Thumbnail URL that was requested
        url: String,
        /// The reason the fetch failed
        reason: String,
    },

    /// Cover image could not be decoded or re-encoded
    #[error("cover processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Reading or writing the tag container failed
    #[error("tag write failed for {path}: {reason}")]
    Write {
        /// The audio file being tagged
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// The blocking tagging task was cancelled or panicked
    #[error("tagging task aborted: {0}")]
    Aborted(String),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "detail": "invalid URL: no video id found in https://example.com",
///   "code": "invalid_url"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message
    pub detail: String,

    /// Machine-readable error code (e.g., "invalid_url", "conversion_failed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code: Some(code.into()),
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - anything the extraction core reports
            Error::InvalidUrl(_) => 400,
            Error::MetadataUnavailable(_) => 400,
            Error::ConversionFailed(_) => 400,
            Error::VerificationFailed { .. } => 400,
            Error::Archive(_) => 400,
            Error::ExternalTool(_) => 400,

            // 500 Internal Server Error - server-side issues
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Serialization(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidUrl(_) => "invalid_url",
            Error::MetadataUnavailable(_) => "metadata_unavailable",
            Error::ConversionFailed(_) => "conversion_failed",
            Error::VerificationFailed { .. } => "verification_failed",
            Error::Archive(_) => "archive_failed",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.error_code(), error.to_string())
    }
}
