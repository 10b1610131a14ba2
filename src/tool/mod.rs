//! External media tool
//!
//! Everything that talks to the outside world about media (metadata
//! lookups, download and transcode) goes through the [`MediaTool`] trait:
//!
//! - [`YtDlp`]: runs the `yt-dlp` binary, which drives ffmpeg
//! - [`UnavailableTool`]: stub for hosts without yt-dlp
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubeaudio::config::ToolsConfig;
//! use tubeaudio::tool::{self, MediaTool};
//!
//! let tool: Arc<dyn MediaTool> = tool::from_config(&ToolsConfig::default());
//! println!("using {}", tool.name());
//! ```

mod traits;
mod unavailable;
mod ytdlp;

pub use traits::{DownloadSpec, MediaTool, RawEntry, RawInfo, RawThumbnail};
pub use unavailable::UnavailableTool;
pub use ytdlp::YtDlp;

use crate::config::ToolsConfig;
use std::sync::Arc;

/// Pick the best available tool for this configuration
///
/// Falls back to [`UnavailableTool`] with a warning if yt-dlp can't be found.
pub fn from_config(config: &ToolsConfig) -> Arc<dyn MediaTool> {
    match YtDlp::from_config(config) {
        Some(tool) => {
            tracing::info!(?tool, "using yt-dlp");
            Arc::new(tool)
        }
        None => {
            tracing::warn!("yt-dlp not found, extractions will fail until it is installed");
            Arc::new(UnavailableTool)
        }
    }
}
