use serde::Serialize;

use crate::request::Filters;

/// One downloadable variant of a media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFormat {
    pub format_id: String,
    pub ext: String,
    pub quality: String,
    pub filesize: Option<u64>,
    pub url: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Total bitrate in kbit/s.
    pub tbr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub platform: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub formats: Vec<MediaFormat>,
    /// Number of formats extracted, before any filter or cap.
    pub total_formats: usize,
    pub filters_applied: Filters,
    pub scraped_url: String,
}
