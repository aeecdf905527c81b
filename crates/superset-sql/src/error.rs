//! Error types for superset-sql.
//!
//! SQL and database failures carry the multi-line diagnostic produced by the
//! client's formatters; the underlying client error is kept as the source.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The client error this failure was built from, if any.
    pub fn client_error(&self) -> Option<&busbar_superset_client::Error> {
        self.source.as_deref()?.downcast_ref()
    }

    /// HTTP status of the failed response, if a response was received.
    pub fn status(&self) -> Option<u16> {
        self.client_error()?.status()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// SQL Lab rejected or failed the statement.
    #[error("{0}")]
    Sql(String),
    /// A database operation failed.
    #[error("{0}")]
    Database(String),
    /// The statement was vetoed by the read-only guard; nothing was sent.
    #[error("{0}")]
    ReadOnly(String),
    #[error("Client error: {0}")]
    Client(String),
}

impl From<busbar_superset_client::Error> for Error {
    fn from(err: busbar_superset_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busbar_superset_client::{Body, ErrorKind as ClientErrorKind, HttpFailure};

    #[test]
    fn test_from_client_error() {
        let client_err = busbar_superset_client::Error::new(ClientErrorKind::Config(
            "no usable credential".into(),
        ));
        let err: Error = client_err.into();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
        assert_eq!(
            err.to_string(),
            "Client error: Configuration error: no usable credential"
        );
        assert!(err.client_error().is_some_and(|e| e.is_config_error()));
    }

    #[test]
    fn test_status_from_source() {
        let client_err = busbar_superset_client::Error::new(ClientErrorKind::Http(
            HttpFailure::new(400, None, Body::Empty),
        ));
        let err = Error::with_source(ErrorKind::Sql("SQL Execution Error".into()), client_err);
        assert_eq!(err.status(), Some(400));
        assert_eq!(Error::new(ErrorKind::Database("x".into())).status(), None);
    }
}
