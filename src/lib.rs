//! HTTP service exposing the yt-dlp media extractor as a key-gated REST API.
//!
//! A request flows through [`auth`], [`request`], [`extractor`] and [`filter`]
//! in that order; [`pipeline::Scraper`] runs the last two for both the HTTP
//! [`server`] and the `scrape` command-line tool.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod server;
