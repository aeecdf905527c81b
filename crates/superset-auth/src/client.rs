//! Authenticated Superset client and request pipeline.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, instrument, warn};

use busbar_superset_client::{
    ClientConfig, Error, ErrorKind, RequestBuilder, Response, Result, SsHttpClient,
};

use crate::authenticator::Authenticator;
use crate::credentials::{CredentialMode, SupersetCredentials};
use crate::csrf::{fetch_csrf_context, CsrfContext};
use crate::refresh::RefreshCoordinator;
use crate::session::SessionState;
use crate::LOGIN_PATH;

/// Where a logical request is in its at-most-one-retry cycle.
#[derive(Debug)]
enum Attempt {
    Initial,
    /// Resent after a refresh; holds the 401 that triggered it.
    Retried(Error),
}

/// Authenticated Superset API client.
///
/// Holds one logical session. Every request goes through the pipeline:
/// credentials are attached, a 401 triggers a single shared refresh, and the
/// request is resent at most once. Mutating requests sent with
/// [`SupersetClient::send_protected`] carry a freshly fetched CSRF token.
///
/// Cloning is cheap; clones share the session.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_superset_auth::{SupersetClient, SupersetCredentials};
///
/// let creds = SupersetCredentials::new("http://localhost:8088")?
///     .with_password("admin", "admin");
/// let client = SupersetClient::new(creds)?;
///
/// let databases: serde_json::Value = client.get_json("/api/v1/database/").await?;
///
/// let created: serde_json::Value = client
///     .post_json("/api/v1/dataset/", &serde_json::json!({"table_name": "orders"}))
///     .await?;
/// ```
#[derive(Clone)]
pub struct SupersetClient {
    http: SsHttpClient,
    authenticator: Arc<Authenticator>,
    refresh: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for SupersetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupersetClient")
            .field("base_url", &self.base_url())
            .field("mode", &self.credential_mode())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

impl SupersetClient {
    /// Create a client with the default HTTP configuration.
    pub fn new(credentials: SupersetCredentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a client with a custom HTTP configuration.
    pub fn with_config(credentials: SupersetCredentials, config: ClientConfig) -> Result<Self> {
        let http = SsHttpClient::new(config)?;
        Ok(Self {
            authenticator: Arc::new(Authenticator::new(http.clone(), credentials)),
            http,
            refresh: Arc::new(RefreshCoordinator::new()),
        })
    }

    /// Create a client from `SUPERSET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SupersetCredentials::from_env()?)
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &SsHttpClient {
        &self.http
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.authenticator.credentials().base_url()
    }

    /// Absolute URL for an API path. Absolute URLs are returned unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }

    /// The credential mode in use.
    pub fn credential_mode(&self) -> CredentialMode {
        self.authenticator.credentials().mode()
    }

    /// Whether write-intent SQL is rejected.
    pub fn is_read_only(&self) -> bool {
        self.authenticator.credentials().read_only()
    }

    /// Whether a usable credential is established.
    pub async fn is_authenticated(&self) -> bool {
        self.authenticator.is_authenticated().await
    }

    /// A snapshot of the session state.
    pub async fn session(&self) -> SessionState {
        self.authenticator.session().await
    }

    /// Establish a usable credential now (logs in again in password mode).
    pub async fn authenticate(&self) -> Result<()> {
        self.authenticator.authenticate().await
    }

    /// Authenticate unless already authenticated.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        self.authenticator.ensure_authenticated().await
    }

    /// Re-authenticate, joining a refresh already in flight.
    ///
    /// On failure the shared `Arc<Error>` seen by every caller of the same
    /// refresh is kept as the source.
    pub async fn refresh(&self) -> Result<()> {
        self.refresh
            .refresh(&self.authenticator)
            .await
            .map_err(|err| Error::with_source(err.kind.clone(), err))
    }

    /// Forget the bearer token and the authenticated flag.
    pub async fn clear_auth_state(&self) {
        self.authenticator.clear().await;
    }

    /// Fetch a CSRF context for one protected request, authenticating first
    /// if needed.
    pub async fn obtain_csrf_context(&self) -> Result<CsrfContext> {
        self.authenticator.ensure_authenticated().await?;
        let token = self.bearer_token().await?;
        fetch_csrf_context(&self.http, self.base_url(), &token).await
    }

    /// Create a GET request for an API path.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// Create a POST request for an API path.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Create a PUT request for an API path.
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    /// Create a PATCH request for an API path.
    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.http.patch(self.url(path))
    }

    /// Create a DELETE request for an API path.
    pub fn delete_request(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }

    /// Send a read request with credentials attached.
    ///
    /// A 401 triggers one refresh and one resend.
    #[instrument(skip(self, request), fields(method = ?request.method(), url = %request.url()))]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.dispatch(request, false).await
    }

    /// Send a mutating request with credentials and a fresh CSRF token.
    ///
    /// A 401 triggers one refresh, a new CSRF token and one resend.
    #[instrument(skip(self, request), fields(method = ?request.method(), url = %request.url()))]
    pub async fn send_protected(&self, request: RequestBuilder) -> Result<Response> {
        self.dispatch(request, true).await
    }

    /// GET a path and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.get(path)).await?.json()
    }

    /// POST a JSON body (protected) and deserialize the JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.post(path).json(body)?;
        self.send_protected(request).await?.json()
    }

    /// PUT a JSON body (protected) and deserialize the JSON response.
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.put(path).json(body)?;
        self.send_protected(request).await?.json()
    }

    /// DELETE a path (protected).
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send_protected(self.delete_request(path)).await?;
        Ok(())
    }

    async fn dispatch(&self, request: RequestBuilder, protected: bool) -> Result<Response> {
        let mut attempt = Attempt::Initial;

        loop {
            let outcome = match self.prepare(request.clone(), protected).await {
                Ok(prepared) => self.http.execute(prepared).await,
                Err(err) => match attempt {
                    Attempt::Initial => Err(err),
                    Attempt::Retried(original) => {
                        error!(error = %err, "Could not prepare request after refresh");
                        self.authenticator.clear().await;
                        return Err(original);
                    }
                },
            };

            let unauthorized = match outcome {
                Err(err) if is_authorization_failure(&err) => err,
                other => return other,
            };

            if matches!(attempt, Attempt::Retried(_)) || targets_login(&request) {
                return Err(unauthorized);
            }

            warn!("Received 401 Unauthorized, refreshing session");

            if let Err(err) = self.refresh.refresh(&self.authenticator).await {
                error!(error = %err, "Session refresh failed");
                self.authenticator.clear().await;
                return Err(unauthorized);
            }

            attempt = Attempt::Retried(unauthorized);
        }
    }

    /// Attach credentials (and a CSRF context for protected requests).
    async fn prepare(&self, request: RequestBuilder, protected: bool) -> Result<RequestBuilder> {
        self.authenticator.ensure_authenticated().await?;

        let session = self.authenticator.session().await;
        if let Some(cookie) = session.session_cookie() {
            debug!("Attaching external session cookie");
            return Ok(request.without_bearer_auth().header("Cookie", cookie));
        }

        let token = session
            .bearer_token()
            .map(str::to_string)
            .ok_or_else(missing_token)?;

        let request = request.bearer_auth(&token);
        if !protected {
            return Ok(request);
        }

        let csrf = fetch_csrf_context(&self.http, self.base_url(), &token).await?;
        Ok(csrf.apply(request))
    }

    async fn bearer_token(&self) -> Result<String> {
        self.authenticator
            .session()
            .await
            .bearer_token()
            .map(str::to_string)
            .ok_or_else(missing_token)
    }
}

/// A 401 on the request itself, or on the CSRF fetch preceding it.
fn is_authorization_failure(err: &Error) -> bool {
    if err.is_unauthorized() {
        return true;
    }

    matches!(err.kind, ErrorKind::Csrf(_))
        && err
            .source
            .as_deref()
            .and_then(|source| source.downcast_ref::<Error>())
            .is_some_and(Error::is_unauthorized)
}

fn targets_login(request: &RequestBuilder) -> bool {
    request.url().contains(LOGIN_PATH)
}

fn missing_token() -> Error {
    Error::new(ErrorKind::Config(
        "no bearer token available for this request".to_string(),
    ))
}
