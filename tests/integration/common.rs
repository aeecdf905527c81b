use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use busbar_superset_api::{ClientConfig, SupersetCredentials};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";

/// Cookie accepted as an externally established (SSO) session.
pub const EXTERNAL_COOKIE: &str = "session=external-sso";

#[derive(Default)]
struct State {
    logins: usize,
    csrf_fetches: usize,
    valid_token: Option<String>,
    issued_csrf: HashSet<String>,
    executed: Vec<String>,
}

/// A stateful stand-in for a Superset server.
///
/// - Login hands out `token-1`, `token-2`, ...; only the latest is valid.
/// - CSRF tokens are single use.
/// - Requests carrying [`EXTERNAL_COOKIE`] are authorized without a bearer
///   token or CSRF token.
pub struct FakeSuperset {
    server: MockServer,
    state: Arc<Mutex<State>>,
}

impl FakeSuperset {
    pub async fn start() -> Self {
        Self::with_login_delay(Duration::ZERO).await
    }

    pub async fn with_login_delay(delay: Duration) -> Self {
        init_tracing();

        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State::default()));

        let login_state = Arc::clone(&state);
        Mock::given(method("POST"))
            .and(path("/api/v1/security/login"))
            .respond_with(move |req: &Request| {
                let body: Value = req.body_json().unwrap_or_default();
                if body["username"] != USERNAME || body["password"] != PASSWORD {
                    return ResponseTemplate::new(401)
                        .set_body_json(json!({"message": "Invalid login. Please try again."}));
                }

                let mut state = login_state.lock().unwrap();
                state.logins += 1;
                let token = format!("token-{}", state.logins);
                state.valid_token = Some(token.clone());

                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": token, "refresh_token": "unused"}))
                    .set_delay(delay)
            })
            .mount(&server)
            .await;

        let csrf_state = Arc::clone(&state);
        Mock::given(method("GET"))
            .and(path("/api/v1/security/csrf_token/"))
            .respond_with(move |req: &Request| {
                let mut state = csrf_state.lock().unwrap();
                if !has_valid_bearer(req, &state) {
                    return expired();
                }

                state.csrf_fetches += 1;
                let token = format!("csrf-{}", state.csrf_fetches);
                state.issued_csrf.insert(token.clone());

                ResponseTemplate::new(200)
                    .insert_header(
                        "set-cookie",
                        format!("session=csrf-session-{}; HttpOnly; Path=/", state.csrf_fetches),
                    )
                    .set_body_json(json!({"result": token}))
            })
            .mount(&server)
            .await;

        let database_state = Arc::clone(&state);
        Mock::given(method("GET"))
            .and(path("/api/v1/database/"))
            .respond_with(move |req: &Request| {
                let state = database_state.lock().unwrap();
                if !has_external_cookie(req) && !has_valid_bearer(req, &state) {
                    return expired();
                }

                ResponseTemplate::new(200).set_body_json(json!({
                    "count": 3,
                    "result": [
                        {"id": 1, "database_name": "READONLY_sales", "backend": "postgresql"},
                        {"id": 2, "database_name": "examples", "backend": "sqlite"},
                        {"id": 3, "database_name": "READER_hr", "backend": "mysql"}
                    ]
                }))
            })
            .mount(&server)
            .await;

        let sqllab_state = Arc::clone(&state);
        Mock::given(method("POST"))
            .and(path("/api/v1/sqllab/execute/"))
            .respond_with(move |req: &Request| {
                let mut state = sqllab_state.lock().unwrap();

                if !has_external_cookie(req) {
                    if !has_valid_bearer(req, &state) {
                        return expired();
                    }

                    let csrf = header(req, "x-csrftoken").unwrap_or_default();
                    if !state.issued_csrf.remove(csrf) {
                        return ResponseTemplate::new(400)
                            .set_body_json(json!({"message": "The CSRF token is invalid."}));
                    }
                }

                let body: Value = req.body_json().unwrap_or_default();
                let sql = body["sql"].as_str().unwrap_or_default().to_string();
                state.executed.push(sql.clone());

                if sql.contains("missing_table") {
                    return ResponseTemplate::new(400).set_body_json(json!({
                        "errors": [{
                            "message": "relation \"missing_table\" does not exist",
                            "error_type": "TABLE_DOES_NOT_EXIST_ERROR",
                            "level": "error",
                            "extra": {"issue_codes": [{"code": 1003, "message": "Issue 1003"}]}
                        }]
                    }));
                }

                ResponseTemplate::new(200).set_body_json(json!({
                    "query_id": state.executed.len(),
                    "status": "success",
                    "data": [{"value": 1}],
                    "columns": [{"name": "value", "type": "INT", "is_dttm": false}],
                    "query": {
                        "dbId": body["database_id"],
                        "sql": sql,
                        "state": "success",
                        "rows": 1,
                        "limit": body["queryLimit"]
                    }
                }))
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::builder()
            .with_timeout(Duration::from_secs(10))
            .build()
    }

    pub fn password_credentials(&self) -> SupersetCredentials {
        SupersetCredentials::new(self.uri())
            .unwrap()
            .with_password(USERNAME, PASSWORD)
    }

    /// Invalidate the current bearer token, as if it had expired.
    pub fn expire_token(&self) {
        self.state.lock().unwrap().valid_token = None;
    }

    /// Accept a pre-issued bearer token.
    pub fn accept_token(&self, token: &str) {
        self.state.lock().unwrap().valid_token = Some(token.to_string());
    }

    pub fn logins(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn csrf_fetches(&self) -> usize {
        self.state.lock().unwrap().csrf_fetches
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }
}

fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}

fn has_external_cookie(req: &Request) -> bool {
    header(req, "cookie") == Some(EXTERNAL_COOKIE)
}

fn has_valid_bearer(req: &Request, state: &State) -> bool {
    match (header(req, "authorization"), &state.valid_token) {
        (Some(value), Some(token)) => value == format!("Bearer {token}"),
        _ => false,
    }
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"msg": "Token has expired"}))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
