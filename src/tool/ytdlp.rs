//! yt-dlp backed media tool

use super::traits::{DownloadSpec, MediaTool, RawInfo};
use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Number of stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Media tool that shells out to the `yt-dlp` binary
///
/// yt-dlp locates ffmpeg itself unless an explicit path is configured.
/// Child processes are killed if the calling future is dropped.
///
/// # Examples
///
/// ```no_run
/// use tubeaudio::config::ToolsConfig;
/// use tubeaudio::tool::{MediaTool, YtDlp};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = YtDlp::from_config(&ToolsConfig::default())
///     .expect("yt-dlp not found in PATH");
///
/// let info = tool.fetch_info("https://youtu.be/dQw4w9WgXcQ").await?;
/// println!("{:?}", info.title);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    proxy: Option<String>,
}

impl YtDlp {
    /// Create a tool with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_path: None,
            proxy: None,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration
    ///
    /// An explicit `ytdlp_path` wins; otherwise PATH is searched if
    /// `search_path` is set. Returns `None` if no binary is available.
    pub fn from_config(config: &ToolsConfig) -> Option<Self> {
        let tool = match &config.ytdlp_path {
            Some(path) => Self::new(path.clone()),
            None if config.search_path => Self::from_path()?,
            None => return None,
        };
        Some(Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            proxy: config.proxy.clone(),
            ..tool
        })
    }

    /// Flags shared by every invocation
    fn base_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-cache-dir".into(),
            "--no-warnings".into(),
            "--no-progress".into(),
        ];
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".into());
            args.push(proxy.into());
        }
        args
    }

    fn info_args(&self, url: &str) -> Vec<OsString> {
        let mut args = self.base_args();
        args.extend(["-J", "--skip-download", "--no-playlist"].map(OsString::from));
        args.push(url.into());
        args
    }

    fn playlist_args(&self, url: &str) -> Vec<OsString> {
        let mut args = self.base_args();
        args.extend(["-J", "--flat-playlist", "--yes-playlist"].map(OsString::from));
        args.push(url.into());
        args
    }

    fn download_args(&self, url: &str, spec: &DownloadSpec) -> Vec<OsString> {
        let mut args = self.base_args();
        let template = spec.output_template();
        args.extend(
            [
                "--no-playlist",
                "--no-part",
                "-f",
                spec.format.as_str(),
                "-x",
                "--audio-format",
                spec.codec.as_str(),
                "--audio-quality",
                spec.quality.as_str(),
                "-o",
                template.as_str(),
            ]
            .map(OsString::from),
        );
        if let Some(ffmpeg) = &self.ffmpeg_path {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }
        args.push(url.into());
        args
    }

    /// Run yt-dlp and return its stdout, mapping failures to `ExternalTool`
    async fn run(&self, args: Vec<OsString>) -> crate::Result<Vec<u8>> {
        debug!(binary = ?self.binary_path, ?args, "running yt-dlp");

        let output = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(crate::Error::ExternalTool(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn fetch_info(&self, url: &str) -> crate::Result<RawInfo> {
        let stdout = self.run(self.info_args(url)).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn fetch_playlist(&self, url: &str) -> crate::Result<RawInfo> {
        let stdout = self.run(self.playlist_args(url)).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn download_audio(&self, url: &str, spec: &DownloadSpec) -> crate::Result<()> {
        self.run(self.download_args(url, spec)).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Last few non-empty lines of stderr, joined
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "no stderr output captured".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn spec() -> DownloadSpec {
        DownloadSpec {
            output_dir: PathBuf::from("/tmp/out"),
            basename: "dQw4w9WgXcQ".into(),
            format: "bestaudio/best".into(),
            codec: "mp3".into(),
            quality: "320K".into(),
        }
    }

    #[test]
    fn download_args_request_mp3_at_320k_into_template() {
        let tool = YtDlp::new(PathBuf::from("yt-dlp"));
        let args = strings(tool.download_args("https://youtu.be/dQw4w9WgXcQ", &spec()));

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-f") + 1], "bestaudio/best");
        assert_eq!(args[pos("--audio-format") + 1], "mp3");
        assert_eq!(args[pos("--audio-quality") + 1], "320K");
        assert_eq!(args[pos("-o") + 1], "/tmp/out/dQw4w9WgXcQ.%(ext)s");
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/dQw4w9WgXcQ");
        assert!(!args.contains(&"--proxy".to_string()));
    }

    #[test]
    fn config_options_are_forwarded() {
        let config = ToolsConfig {
            ytdlp_path: Some(PathBuf::from("/opt/yt-dlp")),
            ffmpeg_path: Some(PathBuf::from("/opt/ffmpeg")),
            search_path: false,
            proxy: Some("socks5://127.0.0.1:7890".into()),
        };
        let tool = YtDlp::from_config(&config).unwrap();
        assert_eq!(tool.binary_path, PathBuf::from("/opt/yt-dlp"));

        let args = strings(tool.download_args("u", &spec()));
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--proxy") + 1], "socks5://127.0.0.1:7890");
        assert_eq!(args[pos("--ffmpeg-location") + 1], "/opt/ffmpeg");
    }

    #[test]
    fn from_config_without_path_or_search_is_none() {
        let config = ToolsConfig {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: false,
            proxy: None,
        };
        assert!(YtDlp::from_config(&config).is_none());
    }

    #[test]
    fn from_path_consistency_with_which_crate() {
        assert_eq!(
            which::which("yt-dlp").is_ok(),
            YtDlp::from_path().is_some(),
            "from_path() should return Some if and only if which::which() succeeds"
        );
    }

    #[test]
    fn metadata_args_skip_download() {
        let tool = YtDlp::new(PathBuf::from("yt-dlp"));
        let info = strings(tool.info_args("u"));
        assert!(info.contains(&"-J".to_string()));
        assert!(info.contains(&"--skip-download".to_string()));

        let playlist = strings(tool.playlist_args("u"));
        assert!(playlist.contains(&"--flat-playlist".to_string()));
        assert!(playlist.contains(&"--yes-playlist".to_string()));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let many: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(many.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
        assert_eq!(stderr_tail(b"\n\n"), "no stderr output captured");
    }

    #[tokio::test]
    async fn missing_binary_is_external_tool_error() {
        let tool = YtDlp::new(PathBuf::from("/nonexistent/yt-dlp-binary-xyz"));
        let err = tool.fetch_info("https://youtu.be/dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, crate::Error::ExternalTool(_)));
    }
}
