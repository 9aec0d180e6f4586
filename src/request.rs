use serde::{Deserialize, Serialize};
use url::Url;

use crate::{config::non_empty, error::ScrapeError};

/// Raw, unvalidated input as it arrives from a query string or a JSON body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScrapeInput {
    pub url: Option<String>,
    pub format_filter: Option<String>,
    pub quality_filter: Option<String>,
}

/// Normalized filters. Also the `filters_applied` object of a result, so the
/// echoed values are the trimmed, lower-cased ones rather than the raw input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub format: Option<String>,
    pub quality: Option<String>,
}

impl Filters {
    pub fn new(format: Option<&str>, quality: Option<&str>) -> Self {
        Self {
            format: format.and_then(normalize_filter),
            quality: quality.and_then(normalize_filter),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.quality.is_none()
    }
}

/// A validated request. Holding one means the URL is an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: Url,
    filters: Filters,
}

impl ScrapeRequest {
    pub fn normalize(input: &ScrapeInput) -> Result<Self, ScrapeError> {
        let raw_url = input
            .url
            .as_deref()
            .and_then(non_empty)
            .ok_or(ScrapeError::MissingUrl)?;

        Ok(Self {
            url: parse_http_url(raw_url)?,
            filters: Filters::new(input.format_filter.as_deref(), input.quality_filter.as_deref()),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn format_filter(&self) -> Option<&str> {
        self.filters.format.as_deref()
    }

    pub fn quality_filter(&self) -> Option<&str> {
        self.filters.quality.as_deref()
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(raw).map_err(|_| ScrapeError::InvalidUrl(raw.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ScrapeError::InvalidUrl(raw.to_string()));
    }
    Ok(parsed)
}

fn normalize_filter(value: &str) -> Option<String> {
    non_empty(value).map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn input(url: Option<&str>, format: Option<&str>, quality: Option<&str>) -> ScrapeInput {
        ScrapeInput {
            url: url.map(ToString::to_string),
            format_filter: format.map(ToString::to_string),
            quality_filter: quality.map(ToString::to_string),
        }
    }

    #[test]
    fn missing_or_blank_url_is_missing() {
        assert_eq!(
            ScrapeRequest::normalize(&input(None, None, None)),
            Err(ScrapeError::MissingUrl)
        );
        assert_eq!(
            ScrapeRequest::normalize(&input(Some("   "), None, None)),
            Err(ScrapeError::MissingUrl)
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        for raw in ["not-a-url", "ftp://example.com/file", "javascript:alert(1)", "http://", "/watch?v=1"] {
            let result = ScrapeRequest::normalize(&input(Some(raw), None, None));
            assert!(
                matches!(result, Err(ScrapeError::InvalidUrl(_))),
                "{raw} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn trims_url_and_lowercases_filters() {
        let request = ScrapeRequest::normalize(&input(
            Some("  https://youtube.com/watch?v=dQw4w9WgXcQ "),
            Some(" MP4 "),
            Some("720P"),
        ))
        .unwrap();

        assert_eq!(request.url().as_str(), "https://youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(request.format_filter(), Some("mp4"));
        assert_eq!(request.quality_filter(), Some("720p"));
    }

    #[test]
    fn blank_filters_are_absent() {
        let request =
            ScrapeRequest::normalize(&input(Some("http://example.com/v"), Some(""), Some("  "))).unwrap();
        assert!(request.filters().is_empty());
    }

    proptest! {
        #[test]
        fn well_formed_http_urls_normalize(
            scheme in "https?",
            host in "[a-z]{1,12}\\.(com|net|tv)",
            path in "(/[a-zA-Z0-9_-]{0,10}){0,3}",
        ) {
            let raw = format!("{scheme}://{host}{path}");
            let request = ScrapeRequest::normalize(&input(Some(&raw), None, None));
            prop_assert!(request.is_ok(), "{} rejected", raw);
        }

        #[test]
        fn schemeless_words_are_invalid(word in "[a-z][a-z0-9-]{0,20}") {
            let result = ScrapeRequest::normalize(&input(Some(&word), None, None));
            prop_assert!(matches!(result, Err(ScrapeError::InvalidUrl(_))));
        }
    }
}
