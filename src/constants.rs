pub mod network {
    pub const DEFAULT_SITE: &str = "datadoghq.com";
    pub const DEFAULT_SUBDOMAIN: &str = "api";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 60_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 10_000;
    pub const API_KEY_HEADER: &str = "DD-API-KEY";
    pub const APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";
    pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];
}

pub mod retry {
    pub const MAX_RETRIES: u32 = 2;
    pub const BASE_DELAY_MS: u64 = 500;
    pub const STATUS_CODES: &[u16] = &[429, 502, 503, 504];
}

pub mod limits {
    pub const TOOL_NAME_MAX_LEN: usize = 96;
    pub const TOOL_DESCRIPTION_MAX_CHARS: usize = 500;
    pub const LARGE_TOOL_COUNT: usize = 250;
    pub const MAX_SUGGESTIONS: usize = 3;
}

pub mod names {
    pub const FALLBACK_OPERATION: &str = "call_api";
    pub const FALLBACK_SLUG: &str = "unnamed";
    pub const LOG_INTAKE_OPERATION: &str = "send_logs";
    pub const ROOT_CATEGORY: &str = "api";
}

pub mod defaults {
    pub const SCHEMA_FILE: &str = "datadog-api-collection-schema.json";
    pub const DOCS_FILE: &str = "TOOLS.md";
    pub const USER_AGENT: &str = concat!("datadog-mcp/", env!("CARGO_PKG_VERSION"));
}
