use crate::collection::CategoryFilter;
use crate::constants::defaults::{SCHEMA_FILE, USER_AGENT};
use crate::constants::network::{DEFAULT_SITE, DEFAULT_SUBDOMAIN, TIMEOUT_API_REQUEST_MS};
use crate::constants::retry as retry_constants;
use crate::http::{Credentials, RequestPolicy, RetryPolicy};
use crate::services::logger::LogLevel;
use crate::utils::feature_flags::enabled_unless_falsy;
use crate::utils::redact::redact_secret;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

const SCHEMA_PATH_VARS: &[&str] = &["MCP_DD_SCHEMA_PATH"];
const FOLDER_VARS: &[&str] = &["MCP_DD_FOLDERS", "MCP_DD_FOLDER_ALLOWLIST"];
const SITE_VARS: &[&str] = &["DD_SITE", "DATADOG_SITE"];
const SUBDOMAIN_VARS: &[&str] = &["DD_SUBDOMAIN"];
const API_KEY_VARS: &[&str] = &[
    "DD_API_KEY",
    "DATADOG_API_KEY",
    "DD_CLIENT_API_KEY",
    "DD_API_TOKEN",
];
const APP_KEY_VARS: &[&str] = &[
    "DD_APP_KEY",
    "DATADOG_APP_KEY",
    "DD_APPLICATION_KEY",
    "DD_CLIENT_APP_KEY",
];

/// Everything the server needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub schema_path: PathBuf,
    pub filter: CategoryFilter,
    pub site: String,
    pub subdomain: String,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub respect_retry_after: bool,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub credentials: Credentials,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(SCHEMA_FILE),
            filter: CategoryFilter::All,
            site: DEFAULT_SITE.to_string(),
            subdomain: DEFAULT_SUBDOMAIN.to_string(),
            max_retries: retry_constants::MAX_RETRIES,
            retry_base_ms: retry_constants::BASE_DELAY_MS,
            respect_retry_after: true,
            timeout_ms: TIMEOUT_API_REQUEST_MS,
            user_agent: USER_AGENT.to_string(),
            credentials: Credentials::default(),
            log_level: LogLevel::Info,
        }
    }
}

/// Command-line values; each one set here beats the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub schema_path: Option<PathBuf>,
    pub folders: Option<String>,
    pub site: Option<String>,
    pub subdomain: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_base_ms: Option<u64>,
    pub no_retry_after: bool,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Comma list of categories. Unset, `*` and `all` mean every category; an
/// empty string selects none.
pub fn parse_folders(raw: Option<&str>) -> CategoryFilter {
    let Some(raw) = raw else {
        return CategoryFilter::All;
    };
    let trimmed = raw.trim();
    if trimmed == "*" || trimmed.eq_ignore_ascii_case("all") {
        return CategoryFilter::All;
    }
    CategoryFilter::only(
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string),
    )
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };
        let defaults = Self::default();
        Self {
            schema_path: first(SCHEMA_PATH_VARS)
                .map(PathBuf::from)
                .unwrap_or(defaults.schema_path),
            filter: parse_folders(FOLDER_VARS.iter().find_map(|key| lookup(key)).as_deref()),
            site: first(SITE_VARS).map(|s| s.trim().to_string()).unwrap_or(defaults.site),
            subdomain: first(SUBDOMAIN_VARS)
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.subdomain),
            max_retries: lookup("MCP_DD_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_ms: lookup("MCP_DD_RETRY_BASE_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry_base_ms),
            respect_retry_after: enabled_unless_falsy(
                lookup("MCP_DD_RESPECT_RETRY_AFTER").as_deref(),
            ),
            timeout_ms: lookup("MCP_DD_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(defaults.timeout_ms),
            user_agent: lookup("MCP_DD_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            credentials: Credentials::new(first(API_KEY_VARS), first(APP_KEY_VARS)),
            log_level: lookup("LOG_LEVEL")
                .map(|v| LogLevel::parse(&v))
                .unwrap_or(defaults.log_level),
        }
    }

    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(path) = &overrides.schema_path {
            self.schema_path = path.clone();
        }
        if let Some(folders) = &overrides.folders {
            self.filter = parse_folders(Some(folders));
        }
        if let Some(site) = overrides.site.as_ref().filter(|s| !s.trim().is_empty()) {
            self.site = site.trim().to_string();
        }
        if let Some(subdomain) = overrides.subdomain.as_ref().filter(|s| !s.trim().is_empty()) {
            self.subdomain = subdomain.trim().to_string();
        }
        if let Some(retries) = overrides.max_retries {
            self.max_retries = retries;
        }
        if let Some(base) = overrides.retry_base_ms {
            self.retry_base_ms = base;
        }
        if overrides.no_retry_after {
            self.respect_retry_after = false;
        }
        if let Some(ms) = overrides.timeout_ms.filter(|ms| *ms > 0) {
            self.timeout_ms = ms;
        }
        if let Some(agent) = &overrides.user_agent {
            self.user_agent = agent.clone();
        }
        self
    }

    pub fn request_policy(&self) -> RequestPolicy {
        RequestPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent: Some(self.user_agent.clone()).filter(|ua| !ua.is_empty()),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay_ms: self.retry_base_ms,
                respect_retry_after: self.respect_retry_after,
                ..RetryPolicy::default()
            },
        }
    }

    pub fn validate(&self) -> Value {
        let schema_exists = self.schema_path.is_file();
        let missing = self.credentials.missing();
        json!({
            "ok": schema_exists && missing.is_empty(),
            "schema_path": self.schema_path.display().to_string(),
            "schema_exists": schema_exists,
            "missing": missing,
        })
    }

    /// Printable view with credentials masked.
    pub fn summary(&self) -> Value {
        json!({
            "schema_path": self.schema_path.display().to_string(),
            "folders": self.filter.describe(),
            "site": self.site,
            "subdomain": self.subdomain,
            "max_retries": self.max_retries,
            "retry_base_ms": self.retry_base_ms,
            "respect_retry_after": self.respect_retry_after,
            "timeout_ms": self.timeout_ms,
            "user_agent": self.user_agent,
            "api_key": redact_secret(self.credentials.api_key()),
            "app_key": redact_secret(self.credentials.app_key()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn folder_parsing() {
        assert_eq!(parse_folders(None), CategoryFilter::All);
        assert_eq!(parse_folders(Some("*")), CategoryFilter::All);
        assert_eq!(parse_folders(Some("ALL")), CategoryFilter::All);
        assert_eq!(parse_folders(Some("")), CategoryFilter::Only(Vec::new()));
        assert_eq!(
            parse_folders(Some(" Monitors, ,Logs ")),
            CategoryFilter::Only(vec!["Monitors".to_string(), "Logs".to_string()])
        );
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_vars(|_| None);
        assert_eq!(config.site, "datadoghq.com");
        assert_eq!(config.subdomain, "api");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_ms, 500);
        assert!(config.respect_retry_after);
        assert_eq!(config.timeout_ms, 60_000);
        assert!(!config.credentials.is_complete());
    }

    #[test]
    fn environment_aliases_and_bad_numbers() {
        let config = Config::from_vars(vars(&[
            ("DATADOG_SITE", "datadoghq.eu"),
            ("DD_APPLICATION_KEY", "app-key-123456"),
            ("DD_API_KEY", "api-key-abcdef"),
            ("MCP_DD_MAX_RETRIES", "many"),
            ("MCP_DD_RETRY_BASE_MS", "10"),
            ("MCP_DD_RESPECT_RETRY_AFTER", "false"),
            ("MCP_DD_FOLDER_ALLOWLIST", "Monitors"),
        ]));
        assert_eq!(config.site, "datadoghq.eu");
        assert!(config.credentials.is_complete());
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_ms, 10);
        assert!(!config.respect_retry_after);
        assert!(config.filter.allows("Monitors"));
        assert!(!config.filter.allows("Logs"));
    }

    #[test]
    fn cli_overrides_win() {
        let config = Config::from_vars(vars(&[
            ("DD_SITE", "datadoghq.eu"),
            ("MCP_DD_FOLDERS", "Logs"),
        ]))
        .apply_overrides(&ConfigOverrides {
                site: Some("us5.datadoghq.com".to_string()),
                folders: Some("Monitors".to_string()),
                no_retry_after: true,
                timeout_ms: Some(1_000),
                ..ConfigOverrides::default()
            });
        assert_eq!(config.site, "us5.datadoghq.com");
        assert!(config.filter.allows("Monitors"));
        assert!(!config.respect_retry_after);
        let policy = config.request_policy();
        assert_eq!(policy.timeout, Duration::from_millis(1_000));
        assert!(!policy.retry.respect_retry_after);
    }

    #[test]
    fn summary_masks_keys() {
        let config = Config::from_vars(vars(&[("DD_API_KEY", "abcdefghijkl")]));
        let summary = config.summary();
        assert_eq!(summary["api_key"], "abc***kl");
        assert_eq!(summary["app_key"], "(unset)");
        let report = config.validate();
        assert_eq!(report["ok"], false);
        assert_eq!(report["missing"], json!(["DD_APP_KEY"]));
    }
}
