use std::sync::Arc;

use clap::Parser;
use media_scraper::{
    config::{self, Config},
    extractor::YtDlpExtractor,
    server,
};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(version, about = "Serve the media scraper API")]
struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let env_file = config::load_env_file();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "media_scraper=info,tower_http=info".to_string()),
        )
        .init();

    match env_file {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => debug!("No .env file found"),
        Err(error) => warn!("Ignoring unreadable .env file: {error}"),
    }

    let args = Args::parse();
    if let Err(error) = run(args).await {
        eprintln!("Server error: {error}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), server::ServeError> {
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if config.uses_default_secret() {
        warn!("API_SECRET_KEY is not set; using the built-in development key. Set a secure key before exposing this service.");
    }
    info!(
        "Extraction via {} (timeout {:?}, at most {} formats per response)",
        config.yt_dlp_path.display(),
        config.request_timeout,
        config.max_formats
    );

    let extractor = Arc::new(YtDlpExtractor::new(config.yt_dlp_path.clone()));
    server::serve(config, extractor).await
}
