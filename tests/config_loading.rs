mod common;
use common::ENV_LOCK;

use datadog_mcp::collection::CategoryFilter;
use datadog_mcp::services::config::{Config, ConfigOverrides};
use std::path::PathBuf;

const KEYS: &[&str] = &[
    "MCP_DD_SCHEMA_PATH",
    "MCP_DD_FOLDERS",
    "MCP_DD_FOLDER_ALLOWLIST",
    "DD_SITE",
    "DATADOG_SITE",
    "DD_API_KEY",
    "DATADOG_API_KEY",
    "DD_CLIENT_API_KEY",
    "DD_API_TOKEN",
    "DD_APP_KEY",
    "DATADOG_APP_KEY",
    "DD_APPLICATION_KEY",
    "DD_CLIENT_APP_KEY",
    "MCP_DD_TIMEOUT_MS",
];

fn snapshot() -> Vec<(&'static str, Option<String>)> {
    KEYS.iter().map(|key| (*key, std::env::var(key).ok())).collect()
}

fn restore(previous: Vec<(&'static str, Option<String>)>) {
    for (key, value) in previous {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

fn clear() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

#[tokio::test]
async fn environment_is_read_with_aliases() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    std::env::set_var("DATADOG_SITE", "datadoghq.eu");
    std::env::set_var("DATADOG_API_KEY", "api-from-alias");
    std::env::set_var("DD_APP_KEY", "app-primary");
    std::env::set_var("MCP_DD_FOLDERS", "Monitors,Logs");
    std::env::set_var("MCP_DD_TIMEOUT_MS", "not-a-number");

    let config = Config::from_env();
    assert_eq!(config.site, "datadoghq.eu");
    assert_eq!(config.credentials.api_key(), Some("api-from-alias"));
    assert_eq!(config.credentials.app_key(), Some("app-primary"));
    assert_eq!(config.filter, CategoryFilter::only(["Monitors", "Logs"]));
    assert_eq!(config.timeout_ms, 60_000);

    restore(previous);
}

#[tokio::test]
async fn primary_names_beat_aliases_and_cli_beats_both() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    std::env::set_var("DD_SITE", "us3.datadoghq.com");
    std::env::set_var("DATADOG_SITE", "datadoghq.eu");
    std::env::set_var("MCP_DD_SCHEMA_PATH", "/tmp/env-collection.json");

    let env_only = Config::from_env();
    assert_eq!(env_only.site, "us3.datadoghq.com");
    assert_eq!(env_only.schema_path, PathBuf::from("/tmp/env-collection.json"));

    let overridden = Config::from_env().apply_overrides(&ConfigOverrides {
        site: Some("ap1.datadoghq.com".to_string()),
        schema_path: Some(PathBuf::from("/tmp/cli-collection.json")),
        folders: Some("all".to_string()),
        ..ConfigOverrides::default()
    });
    assert_eq!(overridden.site, "ap1.datadoghq.com");
    assert_eq!(overridden.schema_path, PathBuf::from("/tmp/cli-collection.json"));
    assert_eq!(overridden.filter, CategoryFilter::All);

    restore(previous);
}

#[tokio::test]
async fn validation_reports_missing_pieces() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    std::env::set_var("MCP_DD_SCHEMA_PATH", "/nonexistent/datadog-collection.json");
    let report = Config::from_env().validate();
    assert_eq!(report["ok"], false);
    assert_eq!(report["schema_exists"], false);
    assert_eq!(report["missing"], serde_json::json!(["DD_API_KEY", "DD_APP_KEY"]));

    restore(previous);
}
