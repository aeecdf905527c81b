//! SQL Lab request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Row limit applied when the request does not set one.
pub const DEFAULT_QUERY_LIMIT: u32 = 1000;

/// A SQL statement to run synchronously in SQL Lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlExecuteRequest {
    pub database_id: i64,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_data: Option<bool>,
}

impl SqlExecuteRequest {
    pub fn new(database_id: i64, sql: impl Into<String>) -> Self {
        Self {
            database_id,
            sql: sql.into(),
            schema: None,
            limit: None,
            expand_data: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_expand_data(mut self, expand_data: bool) -> Self {
        self.expand_data = Some(expand_data);
        self
    }
}

/// Body of `POST /api/v1/sqllab/execute/`.
///
/// Execution is always synchronous and never creates a table from the result.
#[derive(Debug, Serialize)]
pub(crate) struct SqlLabPayload<'a> {
    database_id: i64,
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(rename = "queryLimit")]
    query_limit: u32,
    #[serde(rename = "runAsync")]
    run_async: bool,
    expand_data: bool,
    select_as_cta: bool,
    ctas_method: &'static str,
    json: bool,
}

impl<'a> From<&'a SqlExecuteRequest> for SqlLabPayload<'a> {
    fn from(request: &'a SqlExecuteRequest) -> Self {
        Self {
            database_id: request.database_id,
            sql: &request.sql,
            schema: request.schema.as_deref(),
            query_limit: request
                .limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_QUERY_LIMIT),
            run_async: false,
            expand_data: request.expand_data.unwrap_or(true),
            select_as_cta: false,
            ctas_method: "TABLE",
            json: true,
        }
    }
}

/// Column metadata in a SQL Lab result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultColumn {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub is_date: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Execution details of a SQL Lab query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub db_id: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub executed_sql: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub rows: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub limiting_factor: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub start_dttm: Option<f64>,
    #[serde(default)]
    pub end_dttm: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub temp_schema: Option<String>,
    #[serde(default)]
    pub temp_table: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a synchronous SQL Lab execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlExecuteResponse {
    #[serde(default)]
    pub query_id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub columns: Option<Vec<ResultColumn>>,
    #[serde(default)]
    pub selected_columns: Option<Vec<ResultColumn>>,
    #[serde(default)]
    pub expanded_columns: Option<Vec<ResultColumn>>,
    #[serde(default)]
    pub query: Option<QueryDetails>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SqlExecuteResponse {
    /// Result rows (empty when the query returned none).
    pub fn rows(&self) -> &[Map<String, Value>] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Result column names, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A database connection registered in Superset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub expose_in_sqllab: Option<bool>,
    #[serde(default)]
    pub allow_dml: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatabaseList {
    pub result: Vec<Database>,
}
