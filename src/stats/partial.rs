//! Coerce-or-default readers for loosely typed snapshot records.
//!
//! Snapshots come from older versions, other machines and hand-edited exports,
//! so every field is optional and may hold the wrong JSON type. These helpers
//! never fail: a value that cannot be read as the requested type is `None`.

use serde_json::Value;

/// Reads a value as a number. Numeric strings are parsed, booleans count as
/// `0`/`1` and `null` as `0`. Objects, arrays and non-numeric strings are `None`.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn number_or_zero(value: Option<&Value>) -> f64 {
    number(value).unwrap_or(0.0)
}

pub(crate) fn count(value: Option<&Value>) -> Option<i64> {
    number(value).map(|n| n as i64)
}

pub(crate) fn string(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_are_coerced_like_loose_input() {
        assert_eq!(number(Some(&json!(4))), Some(4.0));
        assert_eq!(number(Some(&json!("12.5"))), Some(12.5));
        assert_eq!(number(Some(&json!(" "))), Some(0.0));
        assert_eq!(number(Some(&json!(true))), Some(1.0));
        assert_eq!(number(Some(&Value::Null)), Some(0.0));
        assert_eq!(number(Some(&json!("twelve"))), None);
        assert_eq!(number(Some(&json!("NaN"))), None);
        assert_eq!(number(Some(&json!({ "a": 1 }))), None);
        assert_eq!(number(None), None);
    }

    #[test]
    fn string_lists_skip_foreign_items() {
        let value = json!([".rs", 4, null, ".toml"]);
        assert_eq!(string_list(Some(&value)), vec![".rs", ".toml"]);
        assert!(string_list(Some(&json!("not a list"))).is_empty());
    }
}
