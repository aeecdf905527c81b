//! Login and credential validation.

use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use busbar_superset_client::{format_auth_error, Error, ErrorKind, Result, SsHttpClient};

use crate::credentials::{CredentialMode, SupersetCredentials};
use crate::session::SessionState;
use crate::LOGIN_PATH;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Establishes a usable credential and owns the session state.
///
/// Logins are serialized by a gate; [`Authenticator::ensure_authenticated`]
/// re-checks the state after acquiring it, so concurrent first requests on a
/// fresh client share a single login.
pub struct Authenticator {
    http: SsHttpClient,
    credentials: SupersetCredentials,
    state: RwLock<SessionState>,
    login_gate: Mutex<()>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator. Nothing is sent until the first call.
    pub fn new(http: SsHttpClient, credentials: SupersetCredentials) -> Self {
        let state = SessionState::new(&credentials);
        Self {
            http,
            credentials,
            state: RwLock::new(state),
            login_gate: Mutex::new(()),
        }
    }

    /// The credentials this authenticator was built from.
    pub fn credentials(&self) -> &SupersetCredentials {
        &self.credentials
    }

    /// A snapshot of the current session state.
    pub async fn session(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Whether a usable credential is established.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Authenticate unless already authenticated.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated().await {
            return Ok(());
        }

        let _gate = self.login_gate.lock().await;
        if self.is_authenticated().await {
            return Ok(());
        }

        self.login().await
    }

    /// Establish a usable credential, logging in again in password mode.
    pub async fn authenticate(&self) -> Result<()> {
        let _gate = self.login_gate.lock().await;
        self.login().await
    }

    /// Drop the authenticated flag and authenticate again.
    pub(crate) async fn reauthenticate(&self) -> Result<()> {
        let _gate = self.login_gate.lock().await;
        self.state.write().await.invalidate();
        self.login().await
    }

    /// Forget the bearer token and the authenticated flag.
    pub async fn clear(&self) {
        self.state.write().await.clear();
    }

    /// Must be called with the login gate held.
    async fn login(&self) -> Result<()> {
        match self.credentials.mode() {
            CredentialMode::SessionCookie => {
                self.state.write().await.mark_authenticated();
                debug!("Using external session cookie");
                Ok(())
            }
            CredentialMode::BearerToken => {
                if self.state.write().await.mark_authenticated() {
                    debug!("Using pre-issued access token");
                    Ok(())
                } else {
                    Err(no_usable_credential())
                }
            }
            CredentialMode::Password => self.password_login().await,
        }
    }

    #[instrument(skip(self), fields(username = ?self.credentials.username()))]
    async fn password_login(&self) -> Result<()> {
        self.state.write().await.clear();

        let (Some(username), Some(password)) =
            (self.credentials.username(), self.credentials.password())
        else {
            return Err(no_usable_credential());
        };

        info!(provider = self.credentials.provider(), "Logging in to Superset");

        let body = serde_json::json!({
            "username": username,
            "password": password,
            "provider": self.credentials.provider(),
            "refresh": true,
        });
        let request = self
            .http
            .post(format!("{}{}", self.credentials.base_url(), LOGIN_PATH))
            .json_value(body);

        let login = match self.http.execute(request).await {
            Ok(response) => response.json::<LoginResponse>(),
            Err(err) => Err(err),
        };

        match login {
            Ok(LoginResponse { access_token }) => {
                self.state.write().await.set_bearer_token(access_token);
                info!("Authenticated with Superset");
                Ok(())
            }
            Err(err) => {
                let diagnostic = format_auth_error(&err);
                error!(status = ?err.status(), "{diagnostic}");
                Err(Error::with_source(ErrorKind::Authentication(diagnostic), err))
            }
        }
    }
}

fn no_usable_credential() -> Error {
    Error::new(ErrorKind::Config(
        "no usable credential: provide a session cookie, an access token, or a username and password"
            .to_string(),
    ))
}
