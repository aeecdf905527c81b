//! # superset-sql
//!
//! Apache Superset SQL Lab client.
//!
//! This crate provides [`SqlClient`] for:
//! - **Execute**: run a statement synchronously in SQL Lab
//! - **Databases**: list the registered database connections
//!
//! In read-only mode, write-intent SQL is rejected before anything is sent
//! and only databases named `READONLY*` or `READER*` are listed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_superset_auth::SupersetCredentials;
//! use busbar_superset_sql::{SqlClient, SqlExecuteRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_superset_sql::Error> {
//!     let creds = SupersetCredentials::new("http://localhost:8088")?
//!         .with_password("admin", "admin")
//!         .with_read_only(true);
//!     let client = SqlClient::new(creds)?;
//!
//!     let result = client
//!         .execute_sql(&SqlExecuteRequest::new(1, "SELECT COUNT(*) FROM orders"))
//!         .await?;
//!
//!     for row in result.rows() {
//!         println!("{row:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{is_read_only_database, SqlClient, READ_ONLY_DATABASE_PREFIXES};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    Database, QueryDetails, ResultColumn, SqlExecuteRequest, SqlExecuteResponse,
    DEFAULT_QUERY_LIMIT,
};

/// SQL Lab synchronous execution endpoint.
pub const SQLLAB_EXECUTE_PATH: &str = "/api/v1/sqllab/execute/";

/// Database list endpoint.
pub const DATABASE_LIST_PATH: &str = "/api/v1/database/";
