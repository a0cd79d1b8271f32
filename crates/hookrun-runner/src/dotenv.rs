//! Renders a secret blob as a dotenv file for the workflow tool.
//!
//! Plain values are written as `KEY='VALUE'`. Values the single-quoted form
//! cannot carry (`'`, `\`, `$`, line breaks) are double-quoted with
//! backslash escapes instead. Lines are sorted by key.

use hookrun_core::{Error, Result};
use std::collections::BTreeMap;

/// Parse a JSON secret blob and render it as dotenv text.
///
/// The blob must be a flat object. Numbers and booleans are written in
/// their JSON form; nested values and `null` are rejected.
pub fn materialize(blob: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(blob)
        .map_err(|e| Error::InvalidSecret(format!("not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidSecret("expected a JSON object".to_string()))?;

    let mut entries = BTreeMap::new();
    for (key, value) in object {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => {
                return Err(Error::InvalidSecret(format!(
                    "value of `{}` must be a string",
                    key
                )));
            }
        };
        entries.insert(key.clone(), value);
    }

    render(&entries)
}

/// Render entries as dotenv lines, each newline-terminated.
pub fn render(entries: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::new();
    for (key, value) in entries {
        validate_key(key)?;
        out.push_str(key);
        out.push('=');
        out.push_str(&quote(value));
        out.push('\n');
    }
    Ok(out)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_key(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSecret(format!(
            "`{}` is not a valid environment variable name",
            key
        )))
    }
}

fn quote(value: &str) -> String {
    let needs_escaping = value
        .chars()
        .any(|c| matches!(c, '\'' | '\\' | '$' | '\n' | '\r'));

    if !needs_escaping {
        return format!("'{}'", value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quoted_form() {
        let text = materialize(r#"{"API_KEY":"abc123","DEBUG":"true"}"#).unwrap();
        assert_eq!(text, "API_KEY='abc123'\nDEBUG='true'\n");
    }

    #[test]
    fn test_one_line_per_entry_sorted() {
        let text = materialize(r#"{"Z":"1","A":"2","M":"3"}"#).unwrap();
        let keys: Vec<_> = text.lines().map(|l| l.split('=').next().unwrap()).collect();
        assert_eq!(keys, vec!["A", "M", "Z"]);
    }

    #[test]
    fn test_values_needing_escapes_are_double_quoted() {
        let text = materialize(r#"{"QUOTE":"it's","MULTI":"a\nb","DOLLAR":"$HOME","BS":"c:\\x"}"#)
            .unwrap();
        assert!(text.contains("QUOTE=\"it's\"\n"));
        assert!(text.contains("MULTI=\"a\\nb\"\n"));
        assert!(text.contains("DOLLAR=\"\\$HOME\"\n"));
        assert!(text.contains("BS=\"c:\\\\x\"\n"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_double_quote_alone_stays_single_quoted() {
        let text = materialize(r#"{"MSG":"say \"hi\""}"#).unwrap();
        assert_eq!(text, "MSG='say \"hi\"'\n");
    }

    #[test]
    fn test_scalars_are_stringified() {
        let text = materialize(r#"{"PORT":8080,"ON":false}"#).unwrap();
        assert_eq!(text, "ON='false'\nPORT='8080'\n");
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(materialize("{}").unwrap(), "");
    }

    #[test]
    fn test_rejects_bad_blobs() {
        for blob in [
            "not json",
            "[1,2]",
            r#"{"NESTED":{"a":1}}"#,
            r#"{"NULL":null}"#,
            r#"{"1BAD":"x"}"#,
            r#"{"BAD KEY":"x"}"#,
            r#"{"":"x"}"#,
        ] {
            let err = materialize(blob).unwrap_err();
            assert!(matches!(err, Error::InvalidSecret(_)), "{}", blob);
        }
    }
}
