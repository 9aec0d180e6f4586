use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Every way a scrape request can fail, one variant per pipeline stage outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid URL format. URL must be an absolute http:// or https:// URL: {0}")]
    InvalidUrl(String),

    #[error("API key is required. Provide it in X-API-Key header or api_key parameter.")]
    MissingCredential,

    #[error("Invalid API key.")]
    InvalidCredential,

    #[error("Extraction timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Endpoint not found")]
    UnknownRoute,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl ScrapeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUrl => "MISSING_URL",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::Timeout { .. } => "TIMEOUT",
            Self::ExtractionFailed(_) => "EXTRACTION_FAILED",
            Self::UnknownRoute => "UNKNOWN_ROUTE",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl(_) | Self::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential => StatusCode::FORBIDDEN,
            Self::UnknownRoute => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout { .. } | Self::ExtractionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON shape of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// A [`ScrapeError`] on its way out of the HTTP layer, tagged with the
/// platform when the failure happened after platform detection.
#[derive(Debug)]
pub struct ApiError {
    pub error: ScrapeError,
    pub platform: Option<String>,
}

impl ApiError {
    pub fn with_platform(error: ScrapeError, platform: impl Into<String>) -> Self {
        Self {
            error,
            platform: Some(platform.into()),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.error.to_string(),
            code: self.error.code(),
            platform: self.platform.clone(),
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(error: ScrapeError) -> Self {
        Self {
            error,
            platform: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.error.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_split_401_and_403() {
        assert_eq!(ScrapeError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ScrapeError::InvalidCredential.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn extraction_errors_are_500() {
        let timeout = ScrapeError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.code(), "TIMEOUT");

        let failed = ScrapeError::ExtractionFailed("ERROR: Private video".into());
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.code(), "EXTRACTION_FAILED");
    }

    #[test]
    fn body_omits_platform_when_unknown() {
        let body = serde_json::to_value(ApiError::from(ScrapeError::MissingUrl).body()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "MISSING_URL");
        assert!(body.get("platform").is_none());

        let tagged = ApiError::with_platform(ScrapeError::ExtractionFailed("boom".into()), "tiktok");
        let body = serde_json::to_value(tagged.body()).unwrap();
        assert_eq!(body["platform"], "tiktok");
        assert_eq!(body["error"], "Extraction failed: boom");
    }
}
