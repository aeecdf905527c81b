//! Superset credentials.
//!
//! All credential material is redacted in Debug output.

use busbar_superset_client::{Error, ErrorKind, Result};

use crate::{DEFAULT_BASE_URL, DEFAULT_PROVIDER};

/// How a client authenticates, chosen from the populated credential fields.
///
/// Precedence is session cookie, then bearer token, then username/password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// An externally supplied session cookie, forwarded verbatim.
    SessionCookie,
    /// A pre-issued bearer token.
    BearerToken,
    /// Username/password login against the security API.
    Password,
}

/// Configuration for connecting to a Superset instance.
///
/// # Example
///
/// ```rust
/// use busbar_superset_auth::{CredentialMode, SupersetCredentials};
///
/// let creds = SupersetCredentials::new("https://superset.example.com/")
///     .unwrap()
///     .with_password("admin", "secret")
///     .with_read_only(true);
///
/// assert_eq!(creds.base_url(), "https://superset.example.com");
/// assert_eq!(creds.mode(), CredentialMode::Password);
/// assert!(creds.read_only());
/// ```
#[derive(Clone)]
pub struct SupersetCredentials {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    session_cookie: Option<String>,
    provider: String,
    read_only: bool,
}

impl std::fmt::Debug for SupersetCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupersetCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field("provider", &self.provider)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl SupersetCredentials {
    /// Create credentials for the given base URL with no credential material.
    ///
    /// The URL must be absolute http(s); a trailing slash is removed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            username: None,
            password: None,
            access_token: None,
            session_cookie: None,
            provider: DEFAULT_PROVIDER.to_string(),
            read_only: false,
        })
    }

    /// Set the username/password pair used for login.
    pub fn with_password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self.password = non_empty(password.into());
        self
    }

    /// Use a pre-issued bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = non_empty(token.into());
        self
    }

    /// Use an externally obtained session cookie (sent as the raw `Cookie` header).
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = non_empty(cookie.into());
        self
    }

    /// Set the identity provider forwarded to the login endpoint (default `db`).
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Enable or disable read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Load credentials from environment variables.
    ///
    /// - `SUPERSET_BASE_URL` (default: `http://localhost:8088`)
    /// - `SUPERSET_USERNAME` / `SUPERSET_PASSWORD`
    /// - `SUPERSET_ACCESS_TOKEN`
    /// - `SUPERSET_SESSION_COOKIE`
    /// - `SUPERSET_AUTH_PROVIDER` (default: `db`)
    /// - `SUPERSET_READ_ONLY_MODE` (`true` enables read-only mode)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).and_then(non_empty);

        let base_url = var("SUPERSET_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut creds = Self::new(base_url)?;

        creds.username = var("SUPERSET_USERNAME");
        creds.password = var("SUPERSET_PASSWORD");
        creds.access_token = var("SUPERSET_ACCESS_TOKEN");
        creds.session_cookie = var("SUPERSET_SESSION_COOKIE");
        if let Some(provider) = var("SUPERSET_AUTH_PROVIDER") {
            creds.provider = provider;
        }
        creds.read_only = var("SUPERSET_READ_ONLY_MODE").as_deref() == Some("true");

        Ok(creds)
    }

    /// The authentication mode these credentials select.
    pub fn mode(&self) -> CredentialMode {
        if self.session_cookie.is_some() {
            CredentialMode::SessionCookie
        } else if self.access_token.is_some() {
            CredentialMode::BearerToken
        } else {
            CredentialMode::Password
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login username, if configured.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub(crate) fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub(crate) fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Identity provider sent with the login request.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Whether write-intent SQL is rejected.
    pub fn read_only(&self) -> bool {
        self.read_only
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::new(ErrorKind::Config(format!(
            "base URL must use http or https, got '{}'",
            parsed.scheme()
        ))));
    }

    Ok(trimmed.to_string())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
