use crate::constants::network::{ALLOWED_SCHEMES, DEFAULT_SITE, DEFAULT_SUBDOMAIN};
use crate::errors::ToolError;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use url::Url;

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static HOST_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*(site|subdomain|baseUrl)\s*\}\}").expect("host token regex")
});

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Renders a JSON scalar the way it should appear in a URL: strings verbatim,
/// everything else in its JSON form.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Expands `{{site}}`, `{{subdomain}}` and `{{baseUrl}}` in one pass.
pub fn resolve_host_tokens(raw: &str, site: Option<&str>, subdomain: Option<&str>) -> String {
    let site = site.filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_SITE);
    let subdomain = subdomain
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SUBDOMAIN);
    HOST_TOKEN
        .replace_all(raw, |caps: &Captures| match &caps[1] {
            "site" => site.to_string(),
            "subdomain" => subdomain.to_string(),
            _ => format!("https://{}.{}", subdomain, site),
        })
        .into_owned()
}

/// Replaces `:key` (only when followed by `/` or the end) and `{{key}}` for
/// every supplied key. Keys without a value keep their placeholder.
pub fn substitute_path_variables(template: &str, vars: &Map<String, Value>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        if value.is_null() || key.is_empty() {
            continue;
        }
        let encoded = encode_component(&render_scalar(value));
        let escaped = regex::escape(key);
        if let Ok(colon) = Regex::new(&format!(":{}(/|$)", escaped)) {
            out = colon
                .replace_all(&out, |caps: &Captures| format!("{}{}", encoded, &caps[1]))
                .into_owned();
        }
        if let Ok(braces) = Regex::new(&format!(r"\{{\{{\s*{}\s*\}}\}}", escaped)) {
            out = braces
                .replace_all(&out, regex::NoExpand(&encoded))
                .into_owned();
        }
    }
    out
}

/// Scalars replace any existing entry of the same key, arrays append one
/// entry per element, nulls are skipped.
pub fn append_query(url: &mut Url, query: &Map<String, Value>) {
    if query.values().all(Value::is_null) {
        return;
    }
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in query {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), render_scalar(item)));
                }
            }
            scalar => {
                let rendered = render_scalar(scalar);
                match pairs.iter().position(|(k, _)| k == key) {
                    Some(first) => {
                        pairs[first].1 = rendered;
                        let mut idx = 0;
                        pairs.retain(|(k, _)| {
                            let keep = k != key || idx == first;
                            idx += 1;
                            keep
                        });
                    }
                    None => pairs.push((key.clone(), rendered)),
                }
            }
        }
    }
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// Full resolution of an operation template into an absolute http(s) URL.
pub fn resolve_url(
    template: &str,
    site: Option<&str>,
    subdomain: Option<&str>,
    path: &Map<String, Value>,
    query: &Map<String, Value>,
) -> Result<Url, ToolError> {
    let hosted = resolve_host_tokens(template, site, subdomain);
    let substituted = substitute_path_variables(&hosted, path);
    let mut url = Url::parse(&substituted).map_err(|err| {
        ToolError::invalid_params(format!("Invalid URL '{}': {}", substituted, err))
    })?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(ToolError::invalid_params(
            "Only http/https URLs are supported",
        ));
    }
    append_query(&mut url, query);
    Ok(url)
}
