//! HTTP response handling with content-type aware body decoding.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// A decoded response body.
///
/// Responses declared `application/json` are parsed; if parsing fails the raw
/// payload is kept. Every other content type is passed through unparsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Parsed JSON payload.
    Json(serde_json::Value),
    /// UTF-8 payload that was not (or could not be) parsed as JSON.
    Text(String),
    /// Non UTF-8 payload.
    Bytes(Bytes),
    /// No payload.
    Empty,
}

impl Body {
    /// Decode a raw payload according to the declared content type.
    pub fn decode(content_type: Option<&str>, raw: Bytes) -> Self {
        if raw.is_empty() {
            return Body::Empty;
        }

        let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
        if is_json {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&raw) {
                return Body::Json(value);
            }
        }

        match String::from_utf8(raw.to_vec()) {
            Ok(text) => Body::Text(text),
            Err(_) => Body::Bytes(raw),
        }
    }

    /// The body rendered as text (lossy for binary payloads).
    pub fn to_text(&self) -> String {
        match self {
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text.clone(),
            Body::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Body::Empty => String::new(),
        }
    }

    /// Returns true if there is no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

/// A successful, fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Body,
    url: String,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(status: u16, headers: HeaderMap, body: Body, url: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body,
            url: url.into(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// URL the response was received from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get every value of a repeated header.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// All `Set-Cookie` header values.
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> + '_ {
        self.header_values("set-cookie")
    }

    /// The decoded body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> Body {
        self.body
    }

    /// The body as text.
    pub fn text(&self) -> String {
        self.body.to_text()
    }

    /// Deserialize the body as JSON.
    ///
    /// Text bodies are parsed as well, so a JSON payload served with a wrong
    /// content type still deserializes.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self.body {
            Body::Json(value) => serde_json::from_value(value).map_err(Into::into),
            Body::Text(text) => serde_json::from_str(&text).map_err(Into::into),
            Body::Bytes(_) | Body::Empty => Err(Error::new(ErrorKind::Json(format!(
                "expected a JSON body from {} but got {}",
                self.url,
                self.headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("no content type")
            )))),
        }
    }
}
