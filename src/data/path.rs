//! Dotted data paths (`"parent.name"`, `"hierarchy.0.id"`).

use super::{is_truthy, Row};
use serde_json::Value;

/// Resolve a dot-separated path inside a JSON value.
///
/// Objects are walked by key and arrays by numeric index. Any missing or
/// non-container intermediate yields `None`; an explicit `null` at the end
/// is returned as `Some(&Value::Null)`.
pub fn resolve_data_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    walk(Some(data), path.split('.'))
}

/// Resolve a dot-separated path starting at a row.
pub fn resolve_row_path<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split('.');
    let first = segments.next()?;
    walk(row.get(first), segments)
}

fn walk<'a, 's>(start: Option<&'a Value>, segments: impl Iterator<Item = &'s str>) -> Option<&'a Value> {
    let mut current = start?;
    for key in segments {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Evaluate a section or field condition.
///
/// No condition always passes. Otherwise the path must resolve to a truthy
/// value; arrays pass only when non-empty.
pub fn check_condition(data: &Value, condition: Option<&str>) -> bool {
    let Some(condition) = condition.filter(|c| !c.is_empty()) else {
        return true;
    };
    match resolve_data_path(data, condition) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(value) => is_truthy(value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_keys() {
        let data = json!({"a": {"b": {"c": 5}}});
        assert_eq!(resolve_data_path(&data, "a.b.c"), Some(&json!(5)));
    }

    #[test]
    fn missing_intermediate_is_none() {
        let data = json!({"a": {}});
        assert_eq!(resolve_data_path(&data, "a.b.c"), None);
        assert_eq!(resolve_data_path(&json!({"a": null}), "a.b"), None);
        assert_eq!(resolve_data_path(&json!(3), "a"), None);
        assert_eq!(resolve_data_path(&data, ""), None);
    }

    #[test]
    fn walks_array_indices() {
        let data = json!({"hierarchy": [{"name": "Order"}, {"name": "Family"}]});
        assert_eq!(
            resolve_data_path(&data, "hierarchy.1.name"),
            Some(&json!("Family"))
        );
        assert_eq!(resolve_data_path(&data, "hierarchy.x.name"), None);
        assert_eq!(resolve_data_path(&data, "hierarchy.9"), None);
    }

    #[test]
    fn row_paths_start_at_the_row() {
        let row = json!({"parent": {"id": 7}}).as_object().cloned().unwrap();
        assert_eq!(resolve_row_path(&row, "parent.id"), Some(&json!(7)));
        assert_eq!(resolve_row_path(&row, "missing.id"), None);
    }

    #[test]
    fn conditions_check_truthiness_and_array_length() {
        let data = json!({"list": [], "full": [1], "flag": false, "name": "x"});
        assert!(check_condition(&data, None));
        assert!(check_condition(&data, Some("")));
        assert!(!check_condition(&data, Some("list")));
        assert!(check_condition(&data, Some("full")));
        assert!(!check_condition(&data, Some("flag")));
        assert!(check_condition(&data, Some("name")));
        assert!(!check_condition(&data, Some("absent")));
    }
}
