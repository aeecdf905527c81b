//! Session lifecycle tests: login, expiry, refresh, credential modes.

use std::time::Duration;

use super::common::{FakeSuperset, EXTERNAL_COOKIE};
use busbar_superset_api::{
    CredentialMode, SqlClient, SqlExecuteRequest, SupersetClient, SupersetCredentials,
};

#[tokio::test]
async fn test_session_survives_token_expiry() {
    let fake = FakeSuperset::start().await;
    let client = SqlClient::with_config(fake.password_credentials(), fake.config()).unwrap();

    assert_eq!(client.list_databases().await.unwrap().len(), 3);
    assert_eq!(fake.logins(), 1);

    fake.expire_token();

    assert_eq!(client.list_databases().await.unwrap().len(), 3);
    assert_eq!(fake.logins(), 2);
}

#[tokio::test]
async fn test_concurrent_protected_requests_share_one_refresh() {
    let fake = FakeSuperset::with_login_delay(Duration::from_millis(200)).await;
    let client = SqlClient::with_config(fake.password_credentials(), fake.config()).unwrap();
    client.inner().authenticate().await.unwrap();

    fake.expire_token();

    let requests: Vec<SqlExecuteRequest> = (0..4)
        .map(|i| SqlExecuteRequest::new(1, format!("SELECT {i}")))
        .collect();
    let results =
        futures::future::join_all(requests.iter().map(|request| client.execute_sql(request)))
            .await;

    for result in results {
        assert_eq!(result.unwrap().status, "success");
    }

    // Initial login plus exactly one refresh.
    assert_eq!(fake.logins(), 2);
    assert_eq!(fake.executed().len(), 4);
    assert_eq!(fake.csrf_fetches(), 4);
}

#[tokio::test]
async fn test_csrf_token_is_never_reused() {
    let fake = FakeSuperset::start().await;
    let client = SqlClient::with_config(fake.password_credentials(), fake.config()).unwrap();

    for i in 0..3 {
        client
            .execute_sql(&SqlExecuteRequest::new(1, format!("SELECT {i}")))
            .await
            .unwrap();
    }

    assert_eq!(fake.csrf_fetches(), 3);
    assert_eq!(fake.logins(), 1);
}

#[tokio::test]
async fn test_cookie_mode_needs_no_login_or_csrf() {
    let fake = FakeSuperset::start().await;
    let creds = SupersetCredentials::new(fake.uri())
        .unwrap()
        .with_password("ignored", "ignored")
        .with_session_cookie(EXTERNAL_COOKIE);
    let client = SqlClient::with_config(creds, fake.config()).unwrap();

    assert_eq!(client.inner().credential_mode(), CredentialMode::SessionCookie);
    assert_eq!(client.list_databases().await.unwrap().len(), 3);
    client
        .execute_sql(&SqlExecuteRequest::new(2, "SELECT 1"))
        .await
        .unwrap();

    assert!(client.inner().is_authenticated().await);
    assert_eq!(fake.logins(), 0);
    assert_eq!(fake.csrf_fetches(), 0);
}

#[tokio::test]
async fn test_token_mode_needs_no_login() {
    let fake = FakeSuperset::start().await;
    fake.accept_token("pre-issued");

    let creds = SupersetCredentials::new(fake.uri())
        .unwrap()
        .with_access_token("pre-issued");
    let client = SupersetClient::with_config(creds, fake.config()).unwrap();

    client.authenticate().await.unwrap();
    assert!(client.is_authenticated().await);

    let databases: serde_json::Value = client.get_json("/api/v1/database/").await.unwrap();
    assert_eq!(databases["count"], 3);
    assert_eq!(fake.logins(), 0);
}

#[tokio::test]
async fn test_expired_pre_issued_token_is_final() {
    let fake = FakeSuperset::start().await;

    let creds = SupersetCredentials::new(fake.uri())
        .unwrap()
        .with_access_token("revoked");
    let client = SupersetClient::with_config(creds, fake.config()).unwrap();

    let err = client
        .send(client.get("/api/v1/database/"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "401 Unauthorized: {\n  \"msg\": \"Token has expired\"\n}");
    assert_eq!(fake.logins(), 0);
}

#[tokio::test]
async fn test_wrong_password_reports_authentication_error() {
    let fake = FakeSuperset::start().await;
    let creds = SupersetCredentials::new(fake.uri())
        .unwrap()
        .with_password("admin", "wrong");
    let client = SqlClient::with_config(creds, fake.config()).unwrap();

    let err = client.list_databases().await.unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("Authentication Error"), "{msg}");
    assert!(msg.contains("Status: 401 Unauthorized"), "{msg}");
    assert!(msg.contains("Invalid username or password"), "{msg}");
    assert!(msg.contains("Invalid login. Please try again."), "{msg}");
    assert!(!client.inner().is_authenticated().await);
}
