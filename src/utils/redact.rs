use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "dd-api-key",
        "dd-application-key",
        "authorization",
        "proxy-authorization",
        "x-api-key",
        "cookie",
    ]
    .into_iter()
    .collect()
});

pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADER_KEYS.contains(name.trim().to_lowercase().as_str())
}

/// Short recognizable form of a credential: `abc***yz`.
pub fn redact_secret(secret: Option<&str>) -> String {
    match secret {
        None | Some("") => "(unset)".to_string(),
        Some(value) if value.chars().count() <= 6 => "***".to_string(),
        Some(value) => {
            let chars: Vec<char> = value.chars().collect();
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[chars.len() - 2..].iter().collect();
            format!("{}***{}", head, tail)
        }
    }
}

/// Header map suitable for logs: credential headers are masked.
pub fn redact_headers<'a, I>(headers: I) -> Value
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut out = serde_json::Map::new();
    for (name, value) in headers {
        let shown = if is_sensitive_header(name) {
            DEFAULT_REDACTION.to_string()
        } else {
            value.clone()
        };
        out.insert(name.clone(), Value::String(shown));
    }
    Value::Object(out)
}

/// Replaces every occurrence of the given secret values inside `text`.
pub fn redact_known(text: &str, secrets: &[&str]) -> String {
    let mut out = text.to_string();
    for secret in secrets {
        let needle = secret.trim();
        if needle.len() < 6 {
            continue;
        }
        out = out.replace(needle, INLINE_REDACTION);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn redact_secret_shapes() {
        assert_eq!(redact_secret(None), "(unset)");
        assert_eq!(redact_secret(Some("")), "(unset)");
        assert_eq!(redact_secret(Some("abcdef")), "***");
        assert_eq!(redact_secret(Some("abcdefgh12")), "abc***12");
    }

    #[test]
    fn redact_headers_masks_credentials_case_insensitively() {
        let mut headers = BTreeMap::new();
        headers.insert("DD-API-KEY".to_string(), "k".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        let out = redact_headers(headers.iter());
        assert_eq!(out["DD-API-KEY"], "[REDACTED]");
        assert_eq!(out["Accept"], "application/json");
    }

    #[test]
    fn redact_known_skips_short_values() {
        let text = "key=abcdef123 app=xyz";
        assert_eq!(
            redact_known(text, &["abcdef123", "xyz"]),
            "key=***REDACTED*** app=xyz"
        );
    }
}
