//! Security utilities for Superset API operations.
//!
//! ## Read-only SQL guard
//!
//! When a client runs in read-only mode every SQL text MUST pass
//! [`sql::validate_read_only`] before it is sent to SQL Lab:
//!
//! ```rust
//! use busbar_superset_client::security::sql;
//!
//! assert!(sql::validate_read_only("SELECT * FROM t", true).is_ok());
//! assert!(sql::validate_read_only("  insert into t values (1)", true).is_err());
//! assert!(sql::validate_read_only("DROP TABLE t", false).is_ok());
//! ```
//!
//! ## Redaction
//!
//! Response bodies quoted in diagnostics go through [`redact::redact_secrets`]
//! first, so bearer tokens and session cookies echoed by a proxy or an error
//! page never end up in logs.

/// Read-only SQL validation.
pub mod sql {
    use crate::error::{Error, ErrorKind, Result};

    /// Keywords that express write intent.
    pub const WRITE_KEYWORDS: [&str; 11] = [
        "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "REPLACE", "MERGE",
        "GRANT", "REVOKE",
    ];

    /// Name reported for `SELECT ... INTO`, which creates a table server-side.
    pub const SELECT_INTO: &str = "SELECT INTO";

    /// Reject write-intent SQL when `read_only` is enabled.
    ///
    /// The check is case-insensitive on the trimmed text. A statement fails if
    /// it begins with a write keyword, contains one as a whole word anywhere
    /// (multi-statement text, CTEs feeding a `DELETE`), or has a whole-word
    /// `INTO` after a `SELECT`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use busbar_superset_client::security::sql;
    ///
    /// let err = sql::validate_read_only("SELECT 1; DROP TABLE t", true).unwrap_err();
    /// assert!(err.to_string().contains("DROP"));
    /// ```
    pub fn validate_read_only(sql: &str, read_only: bool) -> Result<()> {
        if !read_only {
            return Ok(());
        }

        match find_write_intent(sql) {
            Some(keyword) => Err(Error::new(ErrorKind::Validation(format!(
                "Read-only mode: {keyword} operations are not allowed.\n\
                 Only SELECT queries are permitted in read-only mode."
            )))),
            None => Ok(()),
        }
    }

    /// Return the first write-intent keyword found in `sql`, if any.
    #[must_use]
    pub fn find_write_intent(sql: &str) -> Option<&'static str> {
        let normalized = sql.trim().to_ascii_uppercase();

        if let Some(keyword) = WRITE_KEYWORDS
            .into_iter()
            .find(|keyword| normalized.starts_with(keyword))
        {
            return Some(keyword);
        }

        let words: Vec<&str> = words(&normalized).collect();

        if let Some(keyword) = WRITE_KEYWORDS
            .into_iter()
            .find(|keyword| words.contains(keyword))
        {
            return Some(keyword);
        }

        let first_select = words.iter().position(|word| *word == "SELECT");
        if first_select.is_some_and(|select| words[select..].contains(&"INTO")) {
            return Some(SELECT_INTO);
        }

        None
    }

    /// Split text into words; word characters are ASCII alphanumerics and `_`.
    fn words(text: &str) -> impl Iterator<Item = &str> {
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_select_passes() {
            assert!(validate_read_only("SELECT * FROM t", true).is_ok());
            assert!(validate_read_only("select count(*) from orders where x > 1", true).is_ok());
            assert!(validate_read_only("WITH a AS (SELECT 1) SELECT * FROM a", true).is_ok());
        }

        #[test]
        fn test_leading_write_keyword_fails() {
            let err = validate_read_only("  insert into t values (1)", true).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("INSERT"), "{msg}");
            assert!(msg.contains("Read-only mode"), "{msg}");
            assert!(msg.contains("Only SELECT queries are permitted"), "{msg}");
        }

        #[test]
        fn test_every_keyword_is_blocked() {
            for keyword in WRITE_KEYWORDS {
                let sql = format!("{} something", keyword.to_lowercase());
                assert_eq!(find_write_intent(&sql), Some(keyword), "{sql}");
            }
        }

        #[test]
        fn test_embedded_keyword_fails() {
            assert_eq!(find_write_intent("SELECT 1; DROP TABLE t"), Some("DROP"));
            assert_eq!(
                find_write_intent("WITH x AS (SELECT 1) DELETE FROM t"),
                Some("DELETE")
            );
            assert_eq!(
                find_write_intent("select * from t;\ninsert into u values (2)"),
                Some("INSERT")
            );
        }

        #[test]
        fn test_select_into_fails() {
            let err = validate_read_only("SELECT x INTO y FROM t", true).unwrap_err();
            assert!(err.to_string().contains("SELECT INTO"));

            for sql in [
                "(SELECT x INTO y FROM t)",
                "WITH a AS (SELECT 1 AS x) SELECT x INTO y FROM a",
                "/* report */ SELECT x INTO y FROM t",
                "-- note\nSELECT x INTO y FROM t",
            ] {
                assert_eq!(find_write_intent(sql), Some(SELECT_INTO), "{sql}");
            }
        }

        #[test]
        fn test_keyword_must_be_whole_word() {
            assert_eq!(find_write_intent("SELECT updated_at, created FROM t"), None);
            assert_eq!(find_write_intent("SELECT * FROM dropbox_events"), None);
            assert_eq!(find_write_intent("SELECT intonation FROM t"), None);
        }

        #[test]
        fn test_disabled_always_passes() {
            assert!(validate_read_only("DROP TABLE t", false).is_ok());
            assert!(validate_read_only("SELECT x INTO y FROM t", false).is_ok());
            assert!(validate_read_only("", false).is_ok());
        }

        #[test]
        fn test_error_kind_is_validation() {
            let err = validate_read_only("TRUNCATE t", true).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Validation(_)));
        }
    }
}

/// Redaction of credential material quoted in diagnostics.
pub mod redact {
    use std::sync::LazyLock;

    use regex_lite::Regex;

    static JWT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").expect("static regex")
    });

    static SESSION_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"session=[^;\s]+").expect("static regex"));

    /// Replace JWT-shaped tokens and `session=` cookie values.
    #[must_use]
    pub fn redact_secrets(text: &str) -> String {
        let redacted = JWT_PATTERN.replace_all(text, "[REDACTED_TOKEN]");
        SESSION_PATTERN
            .replace_all(&redacted, "session=[REDACTED]")
            .into_owned()
    }

}
