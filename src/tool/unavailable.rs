//! Stand-in tool used when yt-dlp can't be found

use super::traits::{DownloadSpec, MediaTool, RawInfo};
use async_trait::async_trait;

const MISSING: &str = "yt-dlp is not available. \
    Configure ytdlp_path in config or ensure yt-dlp is in PATH.";

/// Media tool that fails every call
///
/// Lets the server start (and answer `/health`) on hosts without yt-dlp;
/// every extraction reports a clear error instead.
pub struct UnavailableTool;

#[async_trait]
impl MediaTool for UnavailableTool {
    async fn fetch_info(&self, _url: &str) -> crate::Result<RawInfo> {
        Err(crate::Error::ExternalTool(MISSING.into()))
    }

    async fn fetch_playlist(&self, _url: &str) -> crate::Result<RawInfo> {
        Err(crate::Error::ExternalTool(MISSING.into()))
    }

    async fn download_audio(&self, _url: &str, _spec: &DownloadSpec) -> crate::Result<()> {
        Err(crate::Error::ExternalTool(MISSING.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
