//! # superset-auth
//!
//! Authenticated sessions for the Apache Superset REST API.
//!
//! ## Security
//!
//! - Passwords, tokens and cookies are redacted in Debug output
//! - Tracing spans skip credential parameters and request bodies
//! - Response text quoted in diagnostics is redacted
//!
//! ## Credential modes
//!
//! The populated fields of [`SupersetCredentials`] select the mode, in this
//! order of precedence:
//!
//! - **Session cookie** - forwarded verbatim as the `Cookie` header; no login,
//!   no bearer token, no CSRF fetch
//! - **Bearer token** - a pre-issued access token; no login
//! - **Password** - `POST /api/v1/security/login`, the returned access token
//!   becomes the bearer token
//!
//! ## Request pipeline
//!
//! [`SupersetClient::send`] and [`SupersetClient::send_protected`] attach the
//! current credential (and, for protected requests, a freshly fetched CSRF
//! token), send once, and on a 401 refresh the session and resend exactly
//! once. Concurrent 401s share a single refresh.
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_superset_auth::{SupersetClient, SupersetCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_superset_auth::Error> {
//!     // From environment variables
//!     let client = SupersetClient::from_env()?;
//!
//!     // Explicit credentials
//!     let creds = SupersetCredentials::new("http://localhost:8088")?
//!         .with_password("admin", "admin");
//!     let client = SupersetClient::new(creds)?;
//!
//!     let databases: serde_json::Value = client.get_json("/api/v1/database/").await?;
//!     Ok(())
//! }
//! ```

mod authenticator;
mod client;
mod credentials;
mod csrf;
mod refresh;
mod session;

pub use authenticator::Authenticator;
pub use client::SupersetClient;
pub use credentials::{CredentialMode, SupersetCredentials};
pub use csrf::{parse_session_cookie, CsrfContext};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use session::SessionState;

pub use busbar_superset_client::{Error, ErrorKind, Result};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/v1/security/login";

/// CSRF token endpoint.
pub const CSRF_PATH: &str = "/api/v1/security/csrf_token/";

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8088";

/// Identity provider sent with the login request when none is configured.
pub const DEFAULT_PROVIDER: &str = "db";
