//! Error classification and diagnostics.
//!
//! Failures are first classified into a [`Classified`] variant with a fixed
//! shape, then rendered. Rendering never fails and never panics, whatever the
//! server sent back.

use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, HttpFailure};
use crate::response::Body;
use crate::security::redact::redact_secrets;

/// Text bodies longer than this are truncated in diagnostics.
const MAX_TEXT_LEN: usize = 500;

const TRUNCATION_MARKER: &str = "...[truncated]";

const HTML_FALLBACK: &str =
    "Server returned HTML response (likely authentication or server error)";

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("static regex"));

/// A failure reduced to one of a fixed set of shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<'a> {
    /// A response with a structured JSON body.
    Json {
        status: u16,
        reason: &'a str,
        payload: &'a Value,
    },
    /// An HTML page, usually from a proxy, login redirect or crash page.
    Html {
        status: u16,
        reason: &'a str,
        title: Option<&'a str>,
    },
    /// Any other body, rendered as text.
    Text {
        status: u16,
        reason: &'a str,
        text: Cow<'a, str>,
    },
    /// No response was received.
    Network { code: &'a str, message: &'a str },
    /// Anything else (configuration, validation, local errors).
    Unknown(String),
}

/// Classify any client error.
pub fn classify(err: &Error) -> Classified<'_> {
    match &err.kind {
        ErrorKind::Http(failure) => classify_failure(failure),
        ErrorKind::Transport { code, message } => Classified::Network {
            code: code.as_str(),
            message: message.as_str(),
        },
        _ => Classified::Unknown(err.to_string()),
    }
}

/// Classify a failed HTTP response.
pub(crate) fn classify_failure(failure: &HttpFailure) -> Classified<'_> {
    let status = failure.status;
    let reason = failure.reason.as_str();

    if failure.is_html() {
        let title = match &failure.body {
            Body::Text(html) => extract_title(html),
            _ => None,
        };
        return Classified::Html {
            status,
            reason,
            title,
        };
    }

    match &failure.body {
        Body::Json(Value::String(text)) => Classified::Text {
            status,
            reason,
            text: Cow::Borrowed(text.as_str()),
        },
        Body::Json(payload) => Classified::Json {
            status,
            reason,
            payload,
        },
        Body::Text(text) => Classified::Text {
            status,
            reason,
            text: Cow::Borrowed(text.as_str()),
        },
        Body::Bytes(bytes) => Classified::Text {
            status,
            reason,
            text: String::from_utf8_lossy(bytes),
        },
        Body::Empty => Classified::Text {
            status,
            reason,
            text: Cow::Borrowed(""),
        },
    }
}

/// Title of an HTML page, unless it is the platform's generic page title.
fn extract_title(html: &str) -> Option<&str> {
    let title = TITLE_PATTERN.captures(html)?.get(1)?.as_str().trim();
    if title.is_empty() || title.to_lowercase().contains("superset") {
        None
    } else {
        Some(title)
    }
}

impl fmt::Display for Classified<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classified::Json {
                status,
                reason,
                payload,
            } => write!(f, "{status} {reason}: {}", summarize_json(payload)),
            Classified::Html {
                status,
                reason,
                title: Some(title),
            } => write!(f, "{status} {reason}: {title}"),
            Classified::Html { status, reason, .. } => {
                write!(f, "{status} {reason}: {HTML_FALLBACK}")
            }
            Classified::Text {
                status,
                reason,
                text,
            } if text.is_empty() => write!(f, "{status} {reason}"),
            Classified::Text {
                status,
                reason,
                text,
            } => write!(f, "{status} {reason}: {}", truncate(&redact_secrets(text))),
            Classified::Network { code, message } => {
                write!(f, "Network error ({code}): {message}")
            }
            Classified::Unknown(message) => f.write_str(message),
        }
    }
}

/// One-line summary of a JSON error payload.
fn summarize_json(payload: &Value) -> String {
    if let Some(message) = payload.get("message").filter(|m| !is_blank(m)) {
        return display_value(message);
    }

    if let Some(Value::Array(errors)) = payload.get("errors") {
        return errors
            .iter()
            .map(entry_message)
            .collect::<Vec<_>>()
            .join(", ");
    }

    pretty(payload)
}

/// Human-readable diagnostic for any client error.
pub fn error_message(err: &Error) -> String {
    classify(err).to_string()
}

/// Diagnostic for a failed SQL Lab execution.
///
/// Surfaces the SQL text, the database id and everything SQL Lab reports:
/// error type and level, issue codes, per-error details and description.
pub fn format_sql_error(err: &Error, sql: Option<&str>, database_id: Option<i64>) -> String {
    let mut out = String::from("SQL Execution Error\n");

    if let Some(sql) = sql.filter(|s| !s.is_empty()) {
        let _ = write!(out, "SQL Query:\n{sql}\n\n");
    }

    if let Some(id) = database_id {
        let _ = write!(out, "Database ID: {id}\n\n");
    }

    let Some(failure) = err.http_failure() else {
        let _ = writeln!(out, "Basic Error: {}", error_message(err));
        return out;
    };

    let _ = writeln!(out, "HTTP Status: {} {}", failure.status, failure.reason);

    let Some(data) = failure.json_object() else {
        let _ = writeln!(
            out,
            "Response Data: {}",
            truncate(&redact_secrets(&failure.body.to_text()))
        );
        return out;
    };

    if let Some(message) = data.get("message").filter(|m| !is_blank(m)) {
        let _ = writeln!(out, "Error Message: {}", display_value(message));
    }

    if let Some(error_type) = data.get("error_type").filter(|v| !is_blank(v)) {
        let _ = writeln!(out, "Error Type: {}", display_value(error_type));
    }

    if let Some(level) = data.get("level").filter(|v| !is_blank(v)) {
        let _ = writeln!(out, "Error Level: {}", display_value(level));
    }

    if let Some(Value::Array(issues)) = data.get("extra").and_then(|e| e.get("issue_codes")) {
        out.push_str("\nIssue Codes:\n");
        for (index, issue) in issues.iter().enumerate() {
            let code = issue.get("code").map(display_value).unwrap_or_default();
            let message = issue.get("message").map(display_value).unwrap_or_default();
            let _ = writeln!(out, "  {}. Code {code}: {message}", index + 1);
        }
    }

    if let Some(Value::Array(errors)) = data.get("errors") {
        out.push_str("\nDetailed Errors:\n");
        for (index, entry) in errors.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", index + 1, entry_message(entry));
            if entry.get("message").is_some() {
                if let Some(error_type) = entry.get("error_type").filter(|v| !is_blank(v)) {
                    let _ = writeln!(out, "     Type: {}", display_value(error_type));
                }
                if let Some(level) = entry.get("level").filter(|v| !is_blank(v)) {
                    let _ = writeln!(out, "     Level: {}", display_value(level));
                }
            }
        }
    }

    if let Some(description) = data.get("description").filter(|v| !is_blank(v)) {
        let _ = write!(out, "\nDescription: {}\n", display_value(description));
    }

    out
}

/// Diagnostic for a failed dataset mutation (create/update/delete/refresh).
pub fn format_dataset_error(err: &Error, operation: &str, dataset_id: Option<i64>) -> String {
    let Some((failure, data)) = err
        .http_failure()
        .and_then(|f| f.json_object().map(|data| (f, data)))
    else {
        return error_message(err);
    };

    let mut out = format!("Dataset {operation} Error\n\n");

    if let Some(id) = dataset_id {
        let _ = writeln!(out, "Dataset ID: {id}");
    }

    let _ = write!(out, "Status: {} {}\n\n", failure.status, failure.reason);

    if failure.status == 400 {
        out.push_str("Validation Errors:\n");
        for (field, messages) in data {
            let _ = writeln!(out, "• {field}: {}", display_object(messages));
        }
        return out;
    }

    if let Some(message) = data.get("message").filter(|m| !is_blank(m)) {
        let _ = writeln!(out, "Message: {}", display_object(message));
    }

    if let Some(Value::Array(errors)) = data.get("errors") {
        out.push_str("Details:\n");
        push_numbered(&mut out, errors);
    }

    out
}

/// Diagnostic for a rejected login, with a remediation hint.
pub fn format_auth_error(err: &Error) -> String {
    let Some(failure) = err.http_failure() else {
        return error_message(err);
    };

    let mut out = String::from("Authentication Error\n\n");
    let _ = write!(out, "Status: {} {}\n\n", failure.status, failure.reason);

    let hint = match failure.status {
        401 => Some((
            "Invalid username or password",
            "Please check the credentials in the client configuration",
        )),
        403 => Some((
            "Access forbidden",
            "Your account may not have sufficient permissions",
        )),
        500 => Some((
            "Server error during authentication",
            "Please check that Superset is running correctly",
        )),
        _ => None,
    };

    if let Some((reason, solution)) = hint {
        let _ = writeln!(out, "Reason: {reason}");
        let _ = writeln!(out, "Solution: {solution}");
    }

    if let Some(message) = failure
        .json_object()
        .and_then(|data| data.get("message"))
        .filter(|m| !is_blank(m))
    {
        let _ = write!(out, "\nServer Message: {}\n", display_value(message));
    }

    out
}

/// Diagnostic for a failed database operation (list, get, connection test).
pub fn format_database_error(err: &Error, operation: &str) -> String {
    let Some(failure) = err.http_failure() else {
        return error_message(err);
    };

    let mut out = format!("Database {operation} Error\n\n");
    let _ = write!(out, "Status: {} {}\n\n", failure.status, failure.reason);

    match failure.status {
        404 => {
            out.push_str("Reason: Database not found\n");
            out.push_str("Solution: Please check if the database ID is correct\n");
        }
        422 => out.push_str("Reason: Request validation failed\n"),
        500 => {
            out.push_str("Reason: Database connection or server error\n");
            out.push_str("Solution: Please check database connectivity and server status\n");
        }
        _ => {}
    }

    if let Some(data) = failure.json_object() {
        let message = data.get("message").filter(|m| !is_blank(m));
        let errors = match data.get("errors") {
            Some(Value::Array(errors)) => Some(errors),
            _ => None,
        };

        if let Some(message) = message {
            let _ = write!(out, "\nMessage: {}\n", display_value(message));
        }

        if let Some(errors) = errors {
            out.push_str("\nDetails:\n");
            push_numbered(&mut out, errors);
        }

        if message.is_none() && errors.is_none() {
            let _ = write!(
                out,
                "\nFull Response:\n{}\n",
                pretty(&Value::Object(data.clone()))
            );
        }
    }

    out
}

fn push_numbered(out: &mut String, entries: &[Value]) {
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, entry_message(entry));
    }
}

/// A single entry of an `errors` array: strings verbatim, objects by their
/// `message`, anything else serialized.
fn entry_message(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.clone(),
        other => match other.get("message").filter(|m| !is_blank(m)) {
            Some(message) => display_value(message),
            None => other.to_string(),
        },
    }
}

/// Strings verbatim, everything else pretty-printed JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty(other),
    }
}

/// Compact rendering of validation payloads such as `{"name": ["required"]}`.
fn display_object(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_object)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => display_map(map),
        other => other.to_string(),
    }
}

fn display_map(map: &Map<String, Value>) -> String {
    if let Some(message) = map.get("message").filter(|m| !is_blank(m)) {
        return display_object(message);
    }

    if map.is_empty() {
        return "{}".to_string();
    }

    map.iter()
        .map(|(key, value)| format!("{key}: {}", display_object(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn truncate(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
