//! # tubeaudio
//!
//! Extract tagged MP3 audio from online videos and playlists.
//!
//! A source URL is resolved to its video id, the media is downloaded and
//! transcoded by yt-dlp (with ffmpeg), and the result is tagged with ID3
//! title/artist/album/year plus a square cover image. Playlists are run
//! entry by entry with per-entry failure isolation and can be packaged as a
//! ZIP archive.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubeaudio::{Config, Extractor, OutputScope, tool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let extractor = Extractor::new(config.clone(), tool::from_config(&config.tools))?;
//!
//!     let result = extractor
//!         .extract("https://youtu.be/dQw4w9WgXcQ", &OutputScope::Standalone)
//!         .await?;
//!     println!("{} -> {}", result.title, result.file_path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Playlist extraction and ZIP packaging
pub mod batch;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Video and playlist metadata
pub mod metadata;
/// Single-item extraction pipeline
pub mod pipeline;
/// Source URL resolution
pub mod resolver;
/// Retry logic
pub mod retry;
/// ID3 tagging and cover art
pub mod tagging;
/// Temporary file management
pub mod temp_files;
/// External media tool integration
pub mod tool;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Download and transcode worker
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, Result, TagError, ToHttpStatus};
pub use pipeline::Extractor;
pub use temp_files::OutputScope;
pub use tool::{MediaTool, YtDlp};
pub use types::{
    ArchiveResult, BatchOutcome, ExtractionResult, ItemId, PlaylistEntryReport, PlaylistReport,
};

/// Wait until the process is asked to stop
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
