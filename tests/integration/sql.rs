//! SQL Lab tests: read-only enforcement, forced parameters, diagnostics.

use super::common::FakeSuperset;
use busbar_superset_api::sql::ErrorKind;
use busbar_superset_api::{client, SqlClient, SqlExecuteRequest};

fn read_only_client(fake: &FakeSuperset) -> SqlClient {
    let creds = fake.password_credentials().with_read_only(true);
    SqlClient::with_config(creds, fake.config()).unwrap()
}

#[tokio::test]
async fn test_read_only_lists_only_read_only_databases() {
    let fake = FakeSuperset::start().await;
    let client = read_only_client(&fake);

    let names: Vec<String> = client
        .list_databases()
        .await
        .unwrap()
        .into_iter()
        .map(|db| db.database_name)
        .collect();

    assert_eq!(names, vec!["READONLY_sales", "READER_hr"]);
}

#[tokio::test]
async fn test_read_only_blocks_writes_without_sending() {
    let fake = FakeSuperset::start().await;
    let client = read_only_client(&fake);

    for statement in [
        "DROP TABLE orders",
        "  insert into orders values (1)",
        "SELECT 1; DELETE FROM orders",
        "SELECT id INTO backup FROM orders",
    ] {
        let err = client
            .execute_sql(&SqlExecuteRequest::new(1, statement))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ReadOnly(_)), "{statement}");
        assert!(err.to_string().contains("Read-only mode"), "{statement}");
    }

    assert!(fake.executed().is_empty());
    assert_eq!(fake.logins(), 0);

    let result = client
        .execute_sql(&SqlExecuteRequest::new(1, "SELECT updated_at FROM orders"))
        .await
        .unwrap();
    assert_eq!(result.rows().len(), 1);
    assert_eq!(fake.executed(), vec!["SELECT updated_at FROM orders"]);
}

#[tokio::test]
async fn test_query_limit_defaults_and_overrides() {
    let fake = FakeSuperset::start().await;
    let client = read_only_client(&fake);

    let result = client
        .execute_sql(&SqlExecuteRequest::new(1, "SELECT 1"))
        .await
        .unwrap();
    let query = result.query.unwrap();
    assert_eq!(query.db_id, Some(1));
    assert_eq!(query.limit, Some(1000));

    let result = client
        .execute_sql(&SqlExecuteRequest::new(3, "SELECT 1").with_limit(25))
        .await
        .unwrap();
    assert_eq!(result.query.unwrap().limit, Some(25));
}

#[tokio::test]
async fn test_sql_failure_diagnostic() {
    let fake = FakeSuperset::start().await;
    let client = read_only_client(&fake);

    let err = client
        .execute_sql(&SqlExecuteRequest::new(1, "SELECT * FROM missing_table"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Sql(_)));
    assert_eq!(err.status(), Some(400));

    let msg = err.to_string();
    assert!(msg.starts_with("SQL Execution Error"), "{msg}");
    assert!(msg.contains("SQL Query:\nSELECT * FROM missing_table"), "{msg}");
    assert!(msg.contains("Database ID: 1"), "{msg}");
    assert!(msg.contains("HTTP Status: 400 Bad Request"), "{msg}");
    assert!(msg.contains("relation \"missing_table\" does not exist"), "{msg}");
    assert!(msg.contains("Type: TABLE_DOES_NOT_EXIST_ERROR"), "{msg}");

    let cause = err.client_error().unwrap();
    assert_eq!(
        client::error_message(cause),
        "400 Bad Request: relation \"missing_table\" does not exist"
    );
}
