//! Per-client session state.

use crate::credentials::{CredentialMode, SupersetCredentials};

/// Credential material and the authenticated flag of one client.
///
/// `is_authenticated` is only ever set while a credential (cookie or bearer
/// token) is held.
#[derive(Clone)]
pub struct SessionState {
    mode: CredentialMode,
    bearer_token: Option<String>,
    session_cookie: Option<String>,
    is_authenticated: bool,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("mode", &self.mode)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

impl SessionState {
    /// Initial state for the given credentials. Nothing is authenticated yet.
    pub fn new(credentials: &SupersetCredentials) -> Self {
        Self {
            mode: credentials.mode(),
            bearer_token: credentials.access_token().map(str::to_string),
            session_cookie: credentials.session_cookie().map(str::to_string),
            is_authenticated: false,
        }
    }

    /// The credential mode selected at construction.
    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    /// Current bearer token.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// External session cookie (cookie mode only).
    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Whether a usable credential is established.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Returns true if a cookie or token is held.
    pub fn has_credential(&self) -> bool {
        self.bearer_token.is_some() || self.session_cookie.is_some()
    }

    /// Mark the session authenticated. Returns false (and changes nothing)
    /// when no credential is held.
    pub(crate) fn mark_authenticated(&mut self) -> bool {
        if self.has_credential() {
            self.is_authenticated = true;
        }
        self.is_authenticated
    }

    pub(crate) fn set_bearer_token(&mut self, token: String) {
        self.bearer_token = Some(token);
        self.is_authenticated = true;
    }

    /// Drop the authenticated flag, keeping credential material.
    pub(crate) fn invalidate(&mut self) {
        self.is_authenticated = false;
    }

    /// Drop the bearer token and the authenticated flag.
    ///
    /// The external session cookie is configuration, not session output, and
    /// survives.
    pub(crate) fn clear(&mut self) {
        self.bearer_token = None;
        self.is_authenticated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> SupersetCredentials {
        SupersetCredentials::new("http://localhost:8088").unwrap()
    }

    #[test]
    fn test_password_mode_starts_empty() {
        let mut state = SessionState::new(&creds().with_password("admin", "admin"));
        assert_eq!(state.mode(), CredentialMode::Password);
        assert!(!state.has_credential());
        assert!(!state.mark_authenticated());
        assert!(!state.is_authenticated());

        state.set_bearer_token("abc".into());
        assert!(state.is_authenticated());
        assert_eq!(state.bearer_token(), Some("abc"));
    }

    #[test]
    fn test_clear_keeps_cookie() {
        let mut state = SessionState::new(&creds().with_session_cookie("session=xyz"));
        assert!(state.mark_authenticated());

        state.clear();
        assert!(!state.is_authenticated());
        assert_eq!(state.session_cookie(), Some("session=xyz"));
    }

    #[test]
    fn test_clear_drops_token() {
        let mut state = SessionState::new(&creds().with_access_token("tok"));
        assert!(state.mark_authenticated());

        state.invalidate();
        assert!(!state.is_authenticated());
        assert_eq!(state.bearer_token(), Some("tok"));

        state.clear();
        assert!(state.bearer_token().is_none());
        assert!(!state.mark_authenticated());
    }

    #[test]
    fn test_debug_redacts() {
        let state = SessionState::new(&creds().with_access_token("very-secret"));
        let debug = format!("{state:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("BearerToken"));
    }
}
