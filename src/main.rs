use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tubeaudio::{Config, Extractor, api, tool};

#[derive(Parser)]
#[command(name = "tubeaudio")]
#[command(about = "HTTP service that extracts tagged MP3 audio from videos and playlists", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long, env = "TUBEAUDIO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long, env = "TUBEAUDIO_BIND")]
    bind: Option<SocketAddr>,
}

/// `RUST_LOG` directives when set and valid, otherwise `info`
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.api.bind_address = bind;
    }

    let config = Arc::new(config);
    let extractor = Arc::new(Extractor::new(config.clone(), tool::from_config(&config.tools))?);

    tracing::info!(
        temp_dir = %config.temp_dir().display(),
        codec = %config.extraction.audio_codec,
        quality = %config.extraction.audio_quality,
        "tubeaudio starting"
    );

    api::start_api_server(extractor, config).await?;
    Ok(())
}
