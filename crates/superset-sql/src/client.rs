//! SQL Lab client.

use tracing::{error, info, instrument, warn};

use busbar_superset_auth::{SupersetClient, SupersetCredentials};
use busbar_superset_client::security::{redact::redact_secrets, sql};
use busbar_superset_client::{format_database_error, format_sql_error, ClientConfig};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{Database, DatabaseList, SqlExecuteRequest, SqlExecuteResponse, SqlLabPayload};
use crate::{DATABASE_LIST_PATH, SQLLAB_EXECUTE_PATH};

/// Database name prefixes visible in read-only mode.
pub const READ_ONLY_DATABASE_PREFIXES: [&str; 2] = ["READONLY", "READER"];

/// SQL execution and database listing.
///
/// In read-only mode every statement passes the read-only guard before it is
/// sent, and only databases whose name starts with `READONLY` or `READER`
/// are listed.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_superset_sql::{SqlClient, SqlExecuteRequest};
///
/// let client = SqlClient::from_env()?;
///
/// for db in client.list_databases().await? {
///     println!("{} {}", db.id, db.database_name);
/// }
///
/// let result = client
///     .execute_sql(&SqlExecuteRequest::new(1, "SELECT * FROM orders").with_limit(10))
///     .await?;
/// println!("{} rows", result.rows().len());
/// ```
#[derive(Debug, Clone)]
pub struct SqlClient {
    client: SupersetClient,
}

impl SqlClient {
    /// Create a SQL client with the given credentials.
    pub fn new(credentials: SupersetCredentials) -> Result<Self> {
        Ok(Self {
            client: SupersetClient::new(credentials)?,
        })
    }

    /// Create a SQL client with custom HTTP configuration.
    pub fn with_config(credentials: SupersetCredentials, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: SupersetClient::with_config(credentials, config)?,
        })
    }

    /// Create a SQL client from `SUPERSET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: SupersetClient::from_env()?,
        })
    }

    /// Create a SQL client sharing an existing session.
    pub fn from_client(client: SupersetClient) -> Self {
        Self { client }
    }

    /// Get the underlying SupersetClient.
    pub fn inner(&self) -> &SupersetClient {
        &self.client
    }

    /// Run a statement synchronously in SQL Lab.
    ///
    /// Read-only violations fail before any network call.
    #[instrument(skip(self, request), fields(database_id = request.database_id))]
    pub async fn execute_sql(&self, request: &SqlExecuteRequest) -> Result<SqlExecuteResponse> {
        if let Err(err) = sql::validate_read_only(&request.sql, self.client.is_read_only()) {
            warn!("Rejected write-intent SQL in read-only mode");
            let diagnostic =
                format_sql_error(&err, Some(request.sql.as_str()), Some(request.database_id));
            return Err(Error::with_source(ErrorKind::ReadOnly(diagnostic), err));
        }

        let payload = SqlLabPayload::from(request);
        let http_request = self.client.post(SQLLAB_EXECUTE_PATH).json(&payload)?;

        let result = match self.client.send_protected(http_request).await {
            Ok(response) => response.json::<SqlExecuteResponse>(),
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => {
                info!(
                    status = %response.status,
                    rows = response.rows().len(),
                    "SQL executed"
                );
                Ok(response)
            }
            Err(err) => {
                error!(
                    status = ?err.status(),
                    body = %err
                        .http_failure()
                        .map(|failure| redact_secrets(&failure.body.to_text()))
                        .unwrap_or_default(),
                    "SQL execution failed"
                );
                let diagnostic =
                    format_sql_error(&err, Some(request.sql.as_str()), Some(request.database_id));
                Err(Error::with_source(ErrorKind::Sql(diagnostic), err))
            }
        }
    }

    /// List databases, restricted to read-only ones in read-only mode.
    #[instrument(skip(self))]
    pub async fn list_databases(&self) -> Result<Vec<Database>> {
        let result = match self.client.send(self.client.get(DATABASE_LIST_PATH)).await {
            Ok(response) => response.json::<DatabaseList>(),
            Err(err) => Err(err),
        };

        let mut databases = result
            .map_err(|err| {
                let diagnostic = format_database_error(&err, "List");
                Error::with_source(ErrorKind::Database(diagnostic), err)
            })?
            .result;

        if self.client.is_read_only() {
            databases.retain(|db| is_read_only_database(&db.database_name));
        }

        Ok(databases)
    }
}

/// Returns true if a database is visible in read-only mode.
pub fn is_read_only_database(name: &str) -> bool {
    READ_ONLY_DATABASE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}
