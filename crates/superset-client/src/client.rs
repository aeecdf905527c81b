//! Core HTTP client with timeouts, compression and response buffering.

use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{reason_phrase, Error, ErrorKind, HttpFailure, Result};
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::{Body, Response};

/// HTTP client for the Superset REST API.
///
/// Every response is buffered. Success (2xx) responses are returned as
/// [`Response`]; anything else becomes an [`ErrorKind::Http`] error carrying
/// the decoded body, so callers can classify it.
#[derive(Debug, Clone)]
pub struct SsHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SsHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed);

        let inner = builder
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Execute a request once and buffer the response.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let url = request_url(&request)?;
        let mut req = self.inner.request(request.method.to_reqwest(), url);

        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        // Content-Type is only declared for methods that carry a body.
        if let Some(ref body) = request.body {
            if request.method.has_body() {
                req = match body {
                    RequestBody::Json(value) => req.json(value),
                    RequestBody::Text(text) => req.body(text.clone()),
                    RequestBody::Bytes(bytes) => req.body(bytes.clone()),
                };
            } else {
                debug!(method = ?request.method, "Ignoring body on a method without one");
            }
        }

        if self.config.enable_tracing {
            debug!(
                method = ?request.method,
                url = %request.url,
                "Sending request"
            );
        }

        let response = req.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let raw = response.bytes().await?;

        if self.config.enable_tracing {
            if (200..300).contains(&status) {
                debug!(status, content_length = raw.len(), "Response received");
            } else {
                info!(status, content_length = raw.len(), "Non-success response");
            }
        }

        let body = Body::decode(content_type.as_deref(), raw);

        if !(200..300).contains(&status) {
            return Err(Error::new(ErrorKind::Http(HttpFailure {
                status,
                reason: reason_phrase(status).to_string(),
                content_type,
                body,
                url,
            })));
        }

        let is_json = content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"));
        if request.url.contains(crate::API_PATH_MARKER) && !is_json {
            warn!(
                url = %request.url,
                content_type = content_type.as_deref().unwrap_or(""),
                "API call returned non-JSON response"
            );
        }

        Ok(Response::new(status, headers, body, url))
    }

    /// Execute a request and deserialize the JSON response.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(request).await?;
        response.json()
    }
}

/// Parse the request URL and append its query parameters.
fn request_url(request: &RequestBuilder) -> Result<url::Url> {
    let mut url = url::Url::parse(&request.url)?;
    if !request.query_params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(request.query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}
