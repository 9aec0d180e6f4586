//! API key checks.
//!
//! The key may arrive in the `X-API-Key` header or the `api_key` query
//! parameter; the header wins when both are present.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::{config::non_empty, error::ScrapeError};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    Missing,
    Invalid,
}

impl AuthOutcome {
    pub fn into_result(self) -> Result<(), ScrapeError> {
        match self {
            Self::Authorized => Ok(()),
            Self::Missing => Err(ScrapeError::MissingCredential),
            Self::Invalid => Err(ScrapeError::InvalidCredential),
        }
    }
}

pub fn authenticate(presented: Option<&str>, secret: &str) -> AuthOutcome {
    match presented {
        None => AuthOutcome::Missing,
        Some(key) if keys_match(key, secret) => AuthOutcome::Authorized,
        Some(_) => AuthOutcome::Invalid,
    }
}

/// Picks the credential from the header first, then the query parameter.
/// Blank values count as absent.
pub fn presented_key<'a>(headers: &'a HeaderMap, query_key: Option<&'a str>) -> Option<&'a str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| non_empty(value).is_some())
        .or_else(|| query_key.filter(|value| non_empty(value).is_some()))
}

// Digests have a fixed length, so the comparison time depends on neither the
// length nor the content of the presented key.
fn keys_match(presented: &str, secret: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let secret = Sha256::digest(secret.as_bytes());
    presented
        .iter()
        .zip(secret.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
