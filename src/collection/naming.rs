//! Derives readable operation names from an HTTP method and a raw URL template.
//!
//! `GET {{baseUrl}}/api/v1/monitor/:monitor_id` becomes `get_monitor`, the
//! collection form `GET .../monitor` becomes `get_monitors`, and action
//! endpoints such as `.../logs/events/search` become `search_logs_events`.
//! Cases no general rule resolves are pinned by [`NameOverride`] entries in
//! [`NamingRules`].

use crate::constants::limits::TOOL_NAME_MAX_LEN;
use crate::constants::names::{FALLBACK_OPERATION, FALLBACK_SLUG, LOG_INTAKE_OPERATION};
use once_cell::sync::Lazy;
use regex::Regex;

static QUERY_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?.*$").expect("query regex"));
static BASE_URL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*baseUrl\s*\}\}").expect("baseUrl regex"));
static SCHEME_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^/]+").expect("scheme regex"));
static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^v\d+$").expect("version regex"));
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex"));

const DEFAULT_ACTIONS: &[&str] = &[
    "search",
    "aggregate",
    "query",
    "mute",
    "unmute",
    "validate",
    "can_delete",
    "estimate",
];

const DEFAULT_OVERRIDES: &[(&str, &str, &str)] = &[
    ("POST", "api/v1/monitor", "create_monitor"),
    ("POST", "api/v1/monitor/validate", "validate_monitor"),
    ("GET", "api/v1/monitor", "get_monitors"),
    ("GET", "api/v1/monitor/search", "search_monitors"),
    ("GET", "api/v1/monitor/groups/search", "search_monitor_groups"),
    ("POST", "api/v1/monitor/:monitor_id/mute", "mute_monitor"),
    ("POST", "api/v1/monitor/:monitor_id/unmute", "unmute_monitor"),
    ("PUT", "api/v1/monitor/:monitor_id", "update_monitor"),
    ("DELETE", "api/v1/monitor/:monitor_id", "delete_monitor"),
    ("GET", "api/v1/monitor/:monitor_id", "get_monitor"),
    ("GET", "api/v1/monitor/can_delete", "can_delete_monitors"),
    ("POST", "api/v2/series", "submit_series"),
    ("POST", "api/v1/distribution_points", "submit_distribution_points"),
];

/// Strips query string, `{{baseUrl}}`, scheme and host, and surrounding
/// slashes: `https://api.{{site}}/api/v1/monitor/?x=1` -> `api/v1/monitor`.
pub fn normalize_path(raw: &str) -> String {
    let without_query = QUERY_STRING.replace(raw, "");
    let without_base = BASE_URL_TOKEN.replace_all(&without_query, "");
    let without_host = SCHEME_HOST.replace(&without_base, "");
    without_host.trim_matches('/').to_string()
}

pub fn is_variable_segment(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('{')
}

pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if word.ends_with("sses") || word.ends_with("ss") {
        return word.to_string();
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

pub fn pluralize(word: &str) -> String {
    if word.is_empty() || word.ends_with('s') {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y') {
        let consonant_before = stem
            .chars()
            .last()
            .map(|c| !"aeiou".contains(c))
            .unwrap_or(false);
        if consonant_before {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", word)
}

/// Lowercases, collapses every run of non-alphanumerics to `_`, trims
/// underscores and caps the length. Never returns an empty string.
pub fn slugify(value: &str, max_len: usize) -> String {
    let lowered = value.to_lowercase();
    let collapsed = NON_ALNUM.replace_all(&lowered, "_");
    let trimmed = collapsed.trim_matches('_');
    let capped: String = trimmed.chars().take(max_len).collect();
    let capped = capped.trim_end_matches('_');
    if capped.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        capped.to_string()
    }
}

fn method_verb(method: &str) -> String {
    match method {
        "GET" => "get".to_string(),
        "POST" => "create".to_string(),
        "PUT" | "PATCH" => "update".to_string(),
        "DELETE" => "delete".to_string(),
        other => other.to_lowercase(),
    }
}

/// A fixed name for one (method, normalized path) shape.
#[derive(Debug, Clone)]
pub struct NameOverride {
    method: String,
    path: Regex,
    raw_url: Option<Regex>,
    name: String,
}

impl NameOverride {
    /// `path_pattern` is a regex matched against the whole normalized path.
    pub fn new(method: &str, path_pattern: &str, name: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            method: method.trim().to_uppercase(),
            path: Regex::new(&format!("^(?:{})$", path_pattern))?,
            raw_url: None,
            name: name.to_string(),
        })
    }

    /// Additionally require the raw, unnormalized URL to match `pattern`
    /// (used to tell intake hosts apart from the regular API host).
    pub fn requiring_raw_url(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.raw_url = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn matches(&self, method: &str, raw: &str, path: &str) -> bool {
        self.method == method
            && self.path.is_match(path)
            && self.raw_url.as_ref().map(|re| re.is_match(raw)).unwrap_or(true)
    }
}

/// Action words and overrides driving name derivation. Overrides are
/// consulted in insertion order and the first match wins.
#[derive(Debug, Clone)]
pub struct NamingRules {
    actions: Vec<String>,
    overrides: Vec<NameOverride>,
    max_len: usize,
}

impl Default for NamingRules {
    fn default() -> Self {
        let log_intake = NameOverride::new("POST", r"api/v\d+/logs/?", LOG_INTAKE_OPERATION)
            .and_then(|rule| rule.requiring_raw_url(r"(?i)http-intake\.logs"))
            .expect("built-in log intake rule");
        let mut rules = Self::empty().with_override(log_intake);
        for (method, path, name) in DEFAULT_OVERRIDES {
            let rule = NameOverride::new(method, path, name).expect("built-in naming override");
            rules = rules.with_override(rule);
        }
        rules
    }
}

impl NamingRules {
    /// Action words only, no overrides.
    pub fn empty() -> Self {
        Self {
            actions: DEFAULT_ACTIONS.iter().map(|s| s.to_string()).collect(),
            overrides: Vec::new(),
            max_len: TOOL_NAME_MAX_LEN,
        }
    }

    pub fn with_override(mut self, rule: NameOverride) -> Self {
        self.overrides.push(rule);
        self
    }

    fn is_action(&self, segment: &str) -> bool {
        self.actions.iter().any(|a| a == segment)
    }

    /// Final tool name: derived name, slugified and length-capped.
    pub fn tool_name(&self, method: &str, raw_url: &str) -> String {
        slugify(&self.derive(method, raw_url), self.max_len)
    }

    pub fn derive(&self, method: &str, raw_url: &str) -> String {
        let method = match method.trim() {
            "" => "GET".to_string(),
            m => m.to_uppercase(),
        };
        let path = normalize_path(raw_url);

        if let Some(rule) = self
            .overrides
            .iter()
            .find(|rule| rule.matches(&method, raw_url, &path))
        {
            return rule.name.clone();
        }

        let segments: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != "api" && !VERSION_SEGMENT.is_match(s))
            .collect();

        let var_idx = segments.iter().position(|s| is_variable_segment(s));
        let has_id = var_idx.is_some();
        let action_word = segments.iter().rev().find(|s| self.is_action(s)).copied();
        let act_idx = segments.iter().position(|s| self.is_action(s));

        let stop_at = [var_idx, act_idx]
            .into_iter()
            .flatten()
            .fold(segments.len(), usize::min);
        let resource_parts = &segments[..stop_at];
        let suffix_start = var_idx.map(|idx| idx + 1).unwrap_or(stop_at);
        let suffix_parts: Vec<&str> = segments[suffix_start..]
            .iter()
            .filter(|s| !self.is_action(s) && !is_variable_segment(s))
            .copied()
            .collect();

        let action = action_word
            .map(str::to_string)
            .unwrap_or_else(|| method_verb(&method));

        let base = if resource_parts.is_empty() {
            suffix_parts.first().copied().unwrap_or("resource").to_string()
        } else {
            resource_parts.join("_")
        };
        let mut tokens: Vec<String> = base
            .split('_')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(last) = tokens.last_mut() {
            *last = if has_id {
                singularize(last)
            } else {
                pluralize(last)
            };
        }
        let mut resource_name = tokens.join("_");

        let keeps_suffix =
            action_word.is_none() || matches!(action.as_str(), "get" | "update" | "delete");
        if !suffix_parts.is_empty() && keeps_suffix {
            let mut parts = vec![resource_name.as_str()];
            parts.extend(suffix_parts.iter().copied());
            resource_name = parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("_");
        }

        let combined = format!("{}_{}", action, resource_name).to_lowercase();
        let name = NON_ALNUM.replace_all(&combined, "_");
        let name = name.trim_matches('_');
        if name.is_empty() {
            FALLBACK_OPERATION.to_string()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(method: &str, raw: &str) -> String {
        NamingRules::default().tool_name(method, raw)
    }

    fn generic(method: &str, raw: &str) -> String {
        NamingRules::empty().tool_name(method, raw)
    }

    #[test]
    fn singular_with_variable_plural_without() {
        assert_eq!(generic("GET", "{{baseUrl}}/api/v1/monitor/:monitor_id"), "get_monitor");
        assert_eq!(generic("GET", "{{baseUrl}}/api/v1/monitor"), "get_monitors");
        assert_eq!(
            generic("DELETE", "{{baseUrl}}/api/v2/incidents/:incident_id"),
            "delete_incident"
        );
        assert_eq!(generic("POST", "{{baseUrl}}/api/v2/incidents"), "create_incidents");
    }

    #[test]
    fn action_words_replace_method_verb() {
        assert_eq!(name("POST", "{{baseUrl}}/api/v2/logs/events/search"), "search_logs_events");
        assert_eq!(name("POST", "{{baseUrl}}/api/v2/query/timeseries"), "query_timeseries");
        assert_eq!(
            name("POST", "{{baseUrl}}/api/v2/logs/analytics/aggregate"),
            "aggregate_logs_analytics"
        );
    }

    #[test]
    fn suffix_segments_follow_the_variable() {
        assert_eq!(
            generic("GET", "{{baseUrl}}/api/v1/tags/hosts/:host_name/source"),
            "get_tags_host_source"
        );
        assert_eq!(
            generic("PATCH", "{{baseUrl}}/api/v2/team/:team_id/links/:link_id"),
            "update_team_links"
        );
    }

    #[test]
    fn overrides_win_over_generic_rules() {
        assert_eq!(name("POST", "{{baseUrl}}/api/v1/monitor/validate"), "validate_monitor");
        assert_eq!(name("GET", "{{baseUrl}}/api/v1/monitor/can_delete"), "can_delete_monitors");
        assert_eq!(name("POST", "{{baseUrl}}/api/v2/series"), "submit_series");
        assert_eq!(name("POST", "https://api.{{site}}/api/v1/monitor"), "create_monitor");
    }

    #[test]
    fn log_intake_requires_intake_host_and_post() {
        assert_eq!(name("POST", "https://http-intake.logs.{{site}}/api/v2/logs"), "send_logs");
        assert_ne!(name("GET", "https://http-intake.logs.{{site}}/api/v2/logs"), "send_logs");
        assert_ne!(name("POST", "{{baseUrl}}/api/v2/logs"), "send_logs");
    }

    #[test]
    fn custom_override_is_data_not_code() {
        let rules = NamingRules::empty().with_override(
            NameOverride::new("GET", "api/v1/validate", "validate_api_key").expect("valid rule"),
        );
        assert_eq!(rules.tool_name("GET", "{{baseUrl}}/api/v1/validate"), "validate_api_key");
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(
            generic("GET", "{{baseUrl}}/api/v1/monitor?group_states=alert&name=x"),
            "get_monitors"
        );
    }

    #[test]
    fn inflection_rules() {
        assert_eq!(singularize("policies"), "policy");
        assert_eq!(singularize("access"), "access");
        assert_eq!(singularize("classes"), "classes");
        assert_eq!(singularize("hosts"), "host");
        assert_eq!(pluralize("policy"), "policies");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("metrics"), "metrics");
        assert_eq!(pluralize("host"), "hosts");
    }

    #[test]
    fn slugify_caps_and_falls_back() {
        assert_eq!(slugify("Get--Monitor__", 96), "get_monitor");
        assert_eq!(slugify("###", 96), "unnamed");
        assert_eq!(slugify("abc_def", 4), "abc");
        let long = "x".repeat(200);
        assert_eq!(slugify(&long, 96).len(), 96);
    }

    #[test]
    fn empty_path_falls_back_to_generic_resource() {
        assert_eq!(generic("GET", "{{baseUrl}}/api/v1"), "get_resources");
    }
}
