//! # superset-client
//!
//! Core HTTP client infrastructure for the Apache Superset REST API.
//!
//! This crate provides the foundational pieces every higher-level crate uses:
//! - A buffered HTTP transport with timeouts, compression and tracing
//! - Content-type aware response bodies (JSON parsed, everything else raw)
//! - A single error type covering configuration, authentication, HTTP,
//!   transport and validation failures
//! - Error classification into human-readable diagnostics
//! - The read-only SQL guard
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (superset-sql, dataset/chart/dashboard consumers)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                SupersetClient (superset-auth)               │
//! │  - Session state, login, single-flight refresh              │
//! │  - CSRF token per protected request                         │
//! │  - 401 → refresh → retry once                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SsHttpClient                             │
//! │  - Raw HTTP with timeouts and compression                   │
//! │  - Response buffering and content-type handling             │
//! │  - Non-2xx responses turned into classified errors          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_superset_client::{ClientConfig, SsHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_superset_client::Error> {
//!     let http = SsHttpClient::new(ClientConfig::default())?;
//!
//!     let response = http
//!         .execute(http.get("http://localhost:8088/health"))
//!         .await?;
//!
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

mod classify;
mod client;
mod config;
mod error;
mod request;
mod response;
pub mod security;

pub use classify::{
    classify, error_message, format_auth_error, format_database_error, format_dataset_error,
    format_sql_error, Classified,
};
pub use client::SsHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, HttpFailure, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::{Body, Response};

/// Path fragment identifying REST API calls (as opposed to UI pages).
pub const API_PATH_MARKER: &str = "/api/";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-superset-api/", env!("CARGO_PKG_VERSION"));
