pub fn is_falsy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Reads an on-by-default switch: only an explicit falsy value turns it off.
pub fn enabled_unless_falsy(value: Option<&str>) -> bool {
    value.map(|v| !is_falsy(v)).unwrap_or(true)
}
