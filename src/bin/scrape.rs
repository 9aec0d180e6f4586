//! One-shot scrape from the terminal: prints the same JSON the API returns.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::Parser;
use media_scraper::{
    config::{self, Config},
    error::ApiError,
    extractor::YtDlpExtractor,
    model::ScrapeResult,
    pipeline::Scraper,
    request::{ScrapeInput, ScrapeRequest},
};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(version, about = "Extract download links for a media URL")]
struct Args {
    /// URL to scrape
    url: String,

    /// Keep only formats with this extension (e.g. mp4, webm)
    #[arg(long)]
    format: Option<String>,

    /// Keep only formats with this quality label (e.g. 720p)
    #[arg(long)]
    quality: Option<String>,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(short, long)]
    pretty: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env_file = config::load_env_file();

    let default_filter = if args.verbose {
        "media_scraper=debug"
    } else {
        "media_scraper=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()))
        .with_writer(std::io::stderr)
        .init();

    match env_file {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => debug!("No .env file found"),
        Err(error) => warn!("Ignoring unreadable .env file: {error}"),
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = scrape(&config, &args).await;

    let rendered = match render(&outcome, args.pretty) {
        Ok(rendered) => rendered,
        Err(error) => {
            eprintln!("Error: could not serialize result: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = emit(&rendered, args.output.as_deref()).await {
        eprintln!("Error: could not write output: {error}");
        return ExitCode::FAILURE;
    }

    if let Err(error) = &outcome {
        if args.verbose {
            eprintln!("Error: {}", error.error);
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn scrape(config: &Config, args: &Args) -> Result<ScrapeResult, ApiError> {
    let request = ScrapeRequest::normalize(&ScrapeInput {
        url: Some(args.url.clone()),
        format_filter: args.format.clone(),
        quality_filter: args.quality.clone(),
    })?;
    debug!(
        "Scraping {} with filters {:?}",
        request.url(),
        request.filters()
    );

    let scraper = Scraper::new(config, Arc::new(YtDlpExtractor::new(config.yt_dlp_path.clone())));
    scraper.scrape(&request).await
}

async fn emit(rendered: &str, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn render(outcome: &Result<ScrapeResult, ApiError>, pretty: bool) -> serde_json::Result<String> {
    match (outcome, pretty) {
        (Ok(result), true) => serde_json::to_string_pretty(result),
        (Ok(result), false) => serde_json::to_string(result),
        (Err(error), true) => serde_json::to_string_pretty(&error.body()),
        (Err(error), false) => serde_json::to_string(&error.body()),
    }
}
