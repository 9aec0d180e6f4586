use std::{collections::HashSet, sync::Arc};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, Method, Request, Uri},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, info_span, warn};
use url::{Url, form_urlencoded};
use uuid::Uuid;

use crate::{
    auth::{self, AuthOutcome},
    config::{Config, ConfigError},
    error::{ApiError, ScrapeError},
    extractor::MediaExtractor,
    model::ScrapeResult,
    pipeline::Scraper,
    platform::PLATFORMS,
    request::{ScrapeInput, ScrapeRequest},
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    scraper: Scraper,
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Http(std::io::Error),
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeQuery {
    url: Option<String>,
    format_filter: Option<String>,
    quality_filter: Option<String>,
}

pub fn build_router(
    config: Arc<Config>,
    extractor: Arc<dyn MediaExtractor>,
) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(&config.allowed_origins)?;
    let state = AppState {
        scraper: Scraper::new(&config, extractor),
        config,
    };

    // Only the path goes into the span: the query may carry the API key.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %Uuid::new_v4(),
        )
    });

    Ok(Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/platforms", get(platforms).fallback(method_not_allowed))
        .route(
            "/scrape",
            get(scrape_get).post(scrape_post).fallback(method_not_allowed),
        )
        .fallback(unknown_route)
        .with_state(state)
        .layer(cors)
        .layer(trace))
}

pub async fn serve(config: Config, extractor: Arc<dyn MediaExtractor>) -> Result<(), ServeError> {
    let addr = config.bind_addr();
    let app = build_router(Arc::new(config), extractor)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Media scraper listening on http://{addr}");

    axum::serve(listener, app).await.map_err(ServeError::Http)
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "Media Scraper API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "API for scraping download links from various media platforms",
        "endpoints": {
            "/scrape": {
                "methods": ["GET", "POST"],
                "description": "Scrape media formats from a URL",
                "parameters": {
                    "url": "Media URL to scrape (required)",
                    "format_filter": "Keep only formats with this extension, e.g. mp4 (optional)",
                    "quality_filter": "Keep only formats with this quality label, e.g. 720p (optional)",
                    "api_key": "API key, or send the X-API-Key header (required)"
                }
            },
            "/platforms": {
                "methods": ["GET"],
                "description": "Recognized platforms (requires API key)"
            },
            "/health": {
                "methods": ["GET"],
                "description": "Health check"
            }
        },
        "supported_platforms": PLATFORMS.iter().map(|platform| platform.name).collect::<Vec<_>>(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Media Scraper API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn platforms(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers, &uri)?;

    Ok(Json(json!({
        "success": true,
        "supported_platforms": &PLATFORMS,
    })))
}

async fn scrape_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<ScrapeResult>, ApiError> {
    authorize(&state, &headers, &uri)?;
    let Query(query) = Query::<ScrapeQuery>::try_from_uri(&uri).map_err(malformed_query)?;

    let request = ScrapeRequest::normalize(&ScrapeInput {
        url: query.url,
        format_filter: query.format_filter,
        quality_filter: query.quality_filter,
    })?;

    Ok(Json(state.scraper.scrape(&request).await?))
}

async fn scrape_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Result<Json<ScrapeResult>, ApiError> {
    authorize(&state, &headers, &uri)?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ScrapeError::MalformedRequest("JSON body is required".to_string()).into());
    }
    let input: ScrapeInput = serde_json::from_slice(&body).map_err(|error| {
        ScrapeError::MalformedRequest(format!("JSON body could not be read: {error}"))
    })?;
    let request = ScrapeRequest::normalize(&input)?;

    Ok(Json(state.scraper.scrape(&request).await?))
}

async fn unknown_route() -> ApiError {
    ScrapeError::UnknownRoute.into()
}

async fn method_not_allowed() -> ApiError {
    ScrapeError::MethodNotAllowed.into()
}

/// Runs before the query is deserialized, so a malformed query without a
/// credential is still rejected as unauthenticated.
fn authorize(state: &AppState, headers: &HeaderMap, uri: &Uri) -> Result<(), ScrapeError> {
    let query_key = uri.query().and_then(api_key_param);
    let outcome = auth::authenticate(
        auth::presented_key(headers, query_key.as_deref()),
        &state.config.api_secret_key,
    );
    if outcome != AuthOutcome::Authorized {
        warn!("Rejected request credential: {outcome:?}");
    }
    outcome.into_result()
}

/// First `api_key` pair of a raw query string. Other pairs are not inspected.
fn api_key_param(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "api_key")
        .map(|(_, value)| value.into_owned())
}

fn malformed_query(rejection: QueryRejection) -> ScrapeError {
    ScrapeError::MalformedRequest(rejection.body_text())
}

fn build_cors_layer(configured: &[String]) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if configured.is_empty() {
        info!("ALLOWED_ORIGINS not set; CORS allows any origin");
        return Ok(layer.allow_origin(Any));
    }

    let normalized_origins = configured
        .iter()
        .map(|origin| normalize_origin(origin).ok_or_else(|| ConfigError::InvalidOrigin(origin.clone())))
        .collect::<Result<HashSet<_>, _>>()?;
    info!(
        "CORS allow-list loaded with {} origin(s): {:?}",
        normalized_origins.len(),
        normalized_origins
    );

    let allowed_origins = Arc::new(normalized_origins);
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let normalized = origin.to_str().ok().and_then(normalize_origin);
        let allowed = normalized
            .as_ref()
            .is_some_and(|value| allowed_origins.contains(value));
        debug!("CORS origin check raw={origin:?} normalized={normalized:?} allowed={allowed}");
        allowed
    });

    Ok(layer.allow_origin(allow_origin))
}

fn normalize_origin(value: &str) -> Option<String> {
    let parsed = Url::parse(value).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let scheme = parsed.scheme();
    let default_port = match scheme {
        "http" => 80,
        "https" => 443,
        _ => return None,
    };

    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return None;
    }

    match parsed.port().filter(|port| *port != default_port) {
        Some(port) => Some(format!("{scheme}://{host}:{port}")),
        None => Some(format!("{scheme}://{host}")),
    }
}
