//! Prefix arithmetic.
//!
//! Prefixes are either empty (bucket root) or end with the delimiter.

/// Returns the parent of a folder prefix.
///
/// ```
/// use s3nav_core::path::parent_prefix;
///
/// assert_eq!(parent_prefix("a/b/c/", "/"), "a/b/");
/// assert_eq!(parent_prefix("a/", "/"), "");
/// assert_eq!(parent_prefix("", "/"), "");
/// ```
pub fn parent_prefix(prefix: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return String::new();
    }

    let trimmed = prefix.strip_suffix(delimiter).unwrap_or(prefix);
    match trimmed.rfind(delimiter) {
        Some(pos) => trimmed[..pos + delimiter.len()].to_string(),
        None => String::new(),
    }
}

/// Returns the prefix of the folder that directly contains `key`.
///
/// ```
/// use s3nav_core::path::containing_prefix;
///
/// assert_eq!(containing_prefix("photos/2024/b.jpg", "/"), "photos/2024/");
/// assert_eq!(containing_prefix("a.txt", "/"), "");
/// ```
pub fn containing_prefix(key: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return String::new();
    }

    match key.rfind(delimiter) {
        Some(pos) => key[..pos + delimiter.len()].to_string(),
        None => String::new(),
    }
}
