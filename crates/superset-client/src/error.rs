//! Error types for superset-client.

use std::fmt;

use crate::response::Body;

/// Result type alias for superset-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for superset-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status of the failed response, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http(failure) => Some(failure.status),
            _ => None,
        }
    }

    /// Returns true if the server answered 401 Unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns true if this is a configuration error (missing credential material, bad URL).
    pub fn is_config_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_) | ErrorKind::InvalidUrl(_))
    }

    /// Returns true if this is an authentication error (login rejected).
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Returns true if no response was received at all.
    pub fn is_transport_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport { .. })
    }

    /// Returns true if the server answered with a 5xx status.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }

    /// The failed response, if this error carries one.
    pub fn http_failure(&self) -> Option<&HttpFailure> {
        match &self.kind {
            ErrorKind::Http(failure) => Some(failure),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// The server answered with a non-success status.
    #[error("{0}")]
    Http(HttpFailure),

    /// No response was received (connect failure, timeout, broken body).
    #[error("Network error ({code}): {message}")]
    Transport { code: String, message: String },

    /// Login was rejected. The message is a formatted diagnostic.
    #[error("{0}")]
    Authentication(String),

    /// Invalid configuration or missing credential material.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request was rejected before it was sent (read-only guard, malformed body).
    #[error("{0}")]
    Validation(String),

    /// The anti-forgery token could not be obtained.
    #[error("Failed to obtain anti-forgery token: {0}")]
    Csrf(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// A non-success HTTP response, fully buffered.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase ("Unauthorized", "Unprocessable Entity", ...).
    pub reason: String,
    /// Declared Content-Type of the response, if any.
    pub content_type: Option<String>,
    /// The decoded response body.
    pub body: Body,
    /// URL of the request that failed.
    pub url: String,
}

impl HttpFailure {
    /// Build a failure from its parts, deriving the reason phrase from the status.
    pub fn new(status: u16, content_type: Option<&str>, body: Body) -> Self {
        Self {
            status,
            reason: reason_phrase(status).to_string(),
            content_type: content_type.map(str::to_string),
            body,
            url: String::new(),
        }
    }

    /// Attach the URL of the failed request.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Returns true if the declared content type is HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
    }

    /// The JSON object body, if the response was a JSON object.
    pub fn json_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match &self.body {
            Body::Json(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&crate::classify::classify_failure(self), f)
    }
}

/// Canonical reason phrase for a status code, empty if unknown.
pub(crate) fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Short transport error code for a reqwest error that produced no response.
fn transport_code(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "TIMEOUT"
    } else if err.is_connect() {
        "CONNECT"
    } else if err.is_redirect() {
        "REDIRECT"
    } else if err.is_body() {
        "BODY"
    } else if err.is_decode() {
        "DECODE"
    } else if err.is_builder() {
        "BUILDER"
    } else if err.is_request() {
        "REQUEST"
    } else {
        "UNKNOWN"
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = ErrorKind::Transport {
            code: transport_code(&err).to_string(),
            message: err.to_string(),
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}
