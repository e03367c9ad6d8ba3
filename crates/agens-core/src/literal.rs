//! Cypher literal rendering.
//!
//! Property maps are embedded into command text, so every string value
//! and every non-trivial key goes through the escaping helpers here.

use std::borrow::Cow;

use serde_json::{Map, Value};

#[inline]
fn needs_escaping(s: &str) -> bool {
    s.chars()
        .any(|ch| matches!(ch, '\\' | '\'' | '"' | '\n' | '\r' | '\t' | '\x00'))
}

/// Escape a string for use inside a quoted Cypher literal.
///
/// Returns the input unchanged (borrowed) when nothing needs escaping.
pub fn escape_string(s: &str) -> Cow<'_, str> {
    if !needs_escaping(s) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\x00' => escaped.push_str("\\u0000"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Render a single-quoted string literal.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape_string(s))
}

/// Render a standard SQL string literal (quotes doubled), for catalog queries.
pub fn quote_sql_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// True when `s` can be used as a bare identifier.
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render an identifier, back-tick quoting it when it is not plain.
pub fn format_identifier(s: &str) -> Cow<'_, str> {
    if is_plain_identifier(s) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("`{}`", s.replace('`', "``")))
    }
}

/// Render an SQL identifier, double-quoting it when it is not plain.
///
/// Plain identifiers stay bare so keywords such as `CURRENT_USER` keep
/// their meaning and case folding is unchanged.
pub fn quote_sql_identifier(s: &str) -> Cow<'_, str> {
    if is_plain_identifier(s) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    }
}

/// Render a JSON value as a Cypher literal.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => format_map(map),
    }
}

fn format_map(map: &Map<String, Value>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{}: {}", format_identifier(k), format_value(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Render a property map literal. An empty map renders as an empty string.
pub fn format_properties(properties: &Map<String, Value>) -> String {
    if properties.is_empty() {
        String::new()
    } else {
        format_map(properties)
    }
}
