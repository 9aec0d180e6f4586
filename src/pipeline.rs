use std::sync::Arc;

use tracing::info;

use crate::{
    config::Config,
    error::ApiError,
    extractor::{ExtractionAdapter, MediaExtractor},
    filter::apply_filters,
    model::ScrapeResult,
    platform::identify_platform,
    request::ScrapeRequest,
};

/// Extract then filter, for one already-validated request. Shared by the HTTP
/// handlers and the CLI.
#[derive(Clone)]
pub struct Scraper {
    adapter: ExtractionAdapter,
    max_formats: usize,
}

impl Scraper {
    pub fn new(config: &Config, extractor: Arc<dyn MediaExtractor>) -> Self {
        Self {
            adapter: ExtractionAdapter::new(extractor, config.request_timeout),
            max_formats: config.max_formats,
        }
    }

    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeResult, ApiError> {
        let platform = identify_platform(request.url());
        info!("Scraping {} (platform {platform})", request.url());

        let extracted = self
            .adapter
            .extract(request, platform)
            .await
            .map_err(|error| ApiError::with_platform(error, platform))?;

        let result = apply_filters(extracted, request.filters(), self.max_formats);
        info!(
            "Scraped {}: {} of {} formats returned",
            request.url(),
            result.formats.len(),
            result.total_formats
        );
        Ok(result)
    }
}
