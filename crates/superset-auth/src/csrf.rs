//! Anti-forgery tokens for mutating requests.

use serde::Deserialize;
use tracing::{debug, instrument};

use busbar_superset_client::{error_message, Error, ErrorKind, RequestBuilder, Result, SsHttpClient};

use crate::CSRF_PATH;

const SESSION_COOKIE_PREFIX: &str = "session=";

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    result: String,
}

/// A CSRF token and its session cookie, valid for one protected request.
///
/// The context cannot be cloned and is consumed by [`CsrfContext::apply`], so
/// it can never be attached to a second request.
pub struct CsrfContext {
    token: String,
    session_cookie: String,
}

impl std::fmt::Debug for CsrfContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfContext")
            .field("token", &"[REDACTED]")
            .field(
                "session_cookie",
                &if self.session_cookie.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .finish()
    }
}

impl CsrfContext {
    /// The anti-forgery token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The session fragment from the token response; empty if none was set.
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// Attach `X-CSRFToken` and, when present, `Cookie: session=...`.
    pub fn apply(self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-CSRFToken", self.token);
        if self.session_cookie.is_empty() {
            request
        } else {
            request.header(
                "Cookie",
                format!("{SESSION_COOKIE_PREFIX}{}", self.session_cookie),
            )
        }
    }
}

/// Fetch a fresh CSRF context with the given bearer token.
#[instrument(skip(http, bearer_token))]
pub(crate) async fn fetch_csrf_context(
    http: &SsHttpClient,
    base_url: &str,
    bearer_token: &str,
) -> Result<CsrfContext> {
    let request = http
        .get(format!("{base_url}{CSRF_PATH}"))
        .bearer_auth(bearer_token);

    let response = http.execute(request).await.map_err(csrf_error)?;
    let session_cookie = parse_session_cookie(response.set_cookies());
    let CsrfResponse { result } = response.json().map_err(csrf_error)?;

    debug!(
        has_session_cookie = !session_cookie.is_empty(),
        "Obtained CSRF token"
    );

    Ok(CsrfContext {
        token: result,
        session_cookie,
    })
}

fn csrf_error(err: Error) -> Error {
    Error::with_source(ErrorKind::Csrf(error_message(&err)), err)
}

/// Session identifier from `Set-Cookie` values: the first entry starting with
/// `session=`, up to the first `;`, without the prefix. Empty if absent.
pub fn parse_session_cookie<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> String {
    set_cookies
        .into_iter()
        .find_map(|cookie| cookie.trim_start().strip_prefix(SESSION_COOKIE_PREFIX))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        .unwrap_or_default()
}
