//! Dot-separated lookups into nested JSON values.

use serde_json::Value;

/// Resolve a dot-separated `path` against `root`.
///
/// Object segments are looked up by key, array segments by decimal index.
/// Returns `None` as soon as a segment is missing or an intermediate value
/// is not a container (including `null`). The empty path yields `root`.
///
/// # Examples
///
/// ```
/// use easystore::path;
/// use serde_json::json;
///
/// let data = json!({"a": {"b": {"c": 5}}, "list": [10, 20]});
/// assert_eq!(path::get(&data, "a.b.c"), Some(&json!(5)));
/// assert_eq!(path::get(&data, "list.1"), Some(&json!(20)));
/// assert_eq!(path::get(&data, "a.x.c"), None);
/// ```
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Like [`get`], but clones the result and falls back to `default`.
///
/// # Examples
///
/// ```
/// use easystore::path;
/// use serde_json::json;
///
/// let data = json!({"a": {}});
/// assert_eq!(path::get_or(&data, "a.b.c", json!("none")), json!("none"));
/// ```
pub fn get_or(root: &Value, path: &str, default: Value) -> Value {
    get(root, path).cloned().unwrap_or(default)
}

/// Split `path` into its first segment and the remainder (possibly empty).
pub(crate) fn split_head(path: &str) -> (&str, &str) {
    match path.split_once('.') {
        Some((head, rest)) => (head, rest),
        None => (path, ""),
    }
}
