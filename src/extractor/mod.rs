//! Extraction adapter: calls the external collaborator under a timeout and
//! reshapes its output into a [`ScrapeResult`].

mod raw;
mod ytdlp;

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::ScrapeError,
    model::{MediaFormat, ScrapeResult},
    request::{Filters, ScrapeRequest},
};

pub use raw::{RawFormat, RawMediaInfo};
pub use ytdlp::YtDlpExtractor;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("{} is not installed or not on PATH", .0.display())]
    NotInstalled(PathBuf),

    #[error("could not run the extractor: {0}")]
    Spawn(#[from] std::io::Error),

    /// The collaborator's own message, kept verbatim.
    #[error("{0}")]
    Failed(String),

    #[error("extractor produced unreadable output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// The opaque collaborator that knows how to pull metadata for a URL.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    fn id(&self) -> &'static str;

    /// May take unbounded time; callers impose their own deadline.
    async fn extract(&self, url: &Url) -> Result<RawMediaInfo, ExtractorError>;
}

#[derive(Clone)]
pub struct ExtractionAdapter {
    extractor: Arc<dyn MediaExtractor>,
    timeout: Duration,
}

impl ExtractionAdapter {
    pub fn new(extractor: Arc<dyn MediaExtractor>, timeout: Duration) -> Self {
        Self { extractor, timeout }
    }

    pub async fn extract(
        &self,
        request: &ScrapeRequest,
        platform: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        debug!(
            "Extracting {} with {} (platform {platform}, timeout {:?})",
            request.url(),
            self.extractor.id(),
            self.timeout
        );

        let raw = tokio::time::timeout(self.timeout, self.extractor.extract(request.url()))
            .await
            .map_err(|_| {
                warn!("Extraction of {} timed out after {:?}", request.url(), self.timeout);
                ScrapeError::Timeout {
                    timeout: self.timeout,
                }
            })?
            .map_err(|error| {
                warn!("Extraction of {} failed: {error}", request.url());
                ScrapeError::ExtractionFailed(error.to_string())
            })?;

        Ok(map_media_info(raw, platform, request.url()))
    }
}

/// Formats without a download URL are dropped; everything else keeps the
/// collaborator's order.
pub fn map_media_info(raw: RawMediaInfo, platform: &str, url: &Url) -> ScrapeResult {
    let formats: Vec<MediaFormat> = raw
        .formats
        .into_iter()
        .enumerate()
        .filter_map(|(index, format)| map_format(index, format))
        .collect();

    ScrapeResult {
        success: true,
        platform: platform.to_string(),
        title: raw.title,
        description: raw.description,
        duration: raw.duration.map(to_count).unwrap_or_default(),
        thumbnail: raw.thumbnail,
        uploader: raw.uploader,
        upload_date: raw.upload_date,
        view_count: raw.view_count.map(to_count).unwrap_or_default(),
        like_count: raw.like_count.map(to_count).unwrap_or_default(),
        total_formats: formats.len(),
        formats,
        filters_applied: Filters::default(),
        scraped_url: url.to_string(),
    }
}

fn map_format(index: usize, format: RawFormat) -> Option<MediaFormat> {
    let url = format.url.filter(|url| !url.trim().is_empty())?;
    let quality = format
        .format_note
        .filter(|note| !note.trim().is_empty())
        .or_else(|| format.height.map(|height| format!("{height}p")))
        .unwrap_or_else(|| "unknown".to_string());

    Some(MediaFormat {
        format_id: format.format_id.unwrap_or_else(|| index.to_string()),
        ext: format.ext.unwrap_or_else(|| "unknown".to_string()),
        quality,
        filesize: format.filesize.or(format.filesize_approx).map(to_count),
        url,
        vcodec: format.vcodec,
        acodec: format.acodec,
        width: format.width,
        height: format.height,
        fps: format.fps,
        tbr: format.tbr,
    })
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
