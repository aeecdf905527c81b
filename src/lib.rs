//! # busbar-superset-api
//!
//! An Apache Superset REST API client library for Rust.
//!
//! This library keeps one authenticated session per client, recovers from
//! token expiry once per request with a single shared refresh, attaches a
//! fresh CSRF token to every mutating call, and can veto write-intent SQL in
//! read-only mode.
//!
//! ## Security
//!
//! - Passwords, tokens and cookies are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Response text quoted in error messages is redacted
//!
//! ## Crates
//!
//! - **busbar-superset-client** - HTTP transport, error classification, read-only SQL guard
//! - **busbar-superset-auth** - Credentials, login, CSRF, single-flight refresh, request pipeline
//! - **busbar-superset-sql** - SQL Lab execution and database listing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_superset_api::{SqlClient, SqlExecuteRequest, SupersetCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = SupersetCredentials::from_env()?;
//!     let client = SqlClient::new(creds)?;
//!
//!     for db in client.list_databases().await? {
//!         println!("{}: {}", db.id, db.database_name);
//!     }
//!
//!     let result = client
//!         .execute_sql(&SqlExecuteRequest::new(1, "SELECT * FROM orders").with_limit(10))
//!         .await?;
//!
//!     for row in result.rows() {
//!         println!("{row:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use busbar_superset_auth as auth;
#[cfg(feature = "client")]
pub use busbar_superset_client as client;
#[cfg(feature = "sql")]
pub use busbar_superset_sql as sql;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use busbar_superset_auth::{CredentialMode, SupersetClient, SupersetCredentials};
#[cfg(feature = "client")]
pub use busbar_superset_client::{error_message, ClientConfig, Error, ErrorKind, Result};
#[cfg(feature = "sql")]
pub use busbar_superset_sql::{Database, SqlClient, SqlExecuteRequest, SqlExecuteResponse};
