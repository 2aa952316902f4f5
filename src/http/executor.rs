use crate::constants::defaults::USER_AGENT;
use crate::constants::network::{
    API_KEY_HEADER, APP_KEY_HEADER, DEFAULT_SITE, DEFAULT_SUBDOMAIN, TIMEOUT_API_REQUEST_MS,
};
use crate::errors::ToolError;
use crate::http::retry::RetryPolicy;
use crate::http::template::resolve_url;
use crate::http::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::logger::Logger;
use crate::utils::redact::{redact_headers, redact_known};
use crate::utils::text::truncate_utf8_prefix;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const INVALID_JSON_SNIPPET_BYTES: usize = 2_000;

/// The two static Datadog keys sent with every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
    app_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("app_key", &self.app_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: Option<String>, app_key: Option<String>) -> Self {
        let clean = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            api_key: clean(api_key),
            app_key: clean(app_key),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn app_key(&self) -> Option<&str> {
        self.app_key.as_deref()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.api_key.is_none() {
            out.push("DD_API_KEY");
        }
        if self.app_key.is_none() {
            out.push("DD_APP_KEY");
        }
        out
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    fn require(&self) -> Result<(&str, &str), ToolError> {
        match (self.api_key.as_deref(), self.app_key.as_deref()) {
            (Some(api), Some(app)) => Ok((api, app)),
            _ => Err(ToolError::precondition(
                "Missing Datadog credentials: set DD_API_KEY and DD_APP_KEY env vars.",
            )
            .with_details(json!({ "missing": self.missing() }))),
        }
    }
}

/// Per-call policy: attempt timeout, user agent and retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(TIMEOUT_API_REQUEST_MS),
            user_agent: Some(USER_AGENT.to_string()),
            retry: RetryPolicy::default(),
        }
    }
}

/// A call against one URL template.
#[derive(Debug, Clone, Default)]
pub struct ApiCall {
    pub method: String,
    pub url_template: String,
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub site: Option<String>,
    pub subdomain: Option<String>,
}

impl ApiCall {
    pub fn new(method: &str, url_template: &str) -> Self {
        Self {
            method: method.to_string(),
            url_template: url_template.to_string(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, key: &str, value: Value) -> Self {
        self.query.insert(key.to_string(), value);
        self
    }

    pub fn with_path(mut self, key: &str, value: Value) -> Self {
        self.path.insert(key.to_string(), value);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Normalized result of a call. Non-2xx statuses are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOutcome {
    pub status: u16,
    pub ok: bool,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
    pub url: String,
    pub method: String,
    pub attempts: u32,
}

impl RequestOutcome {
    pub fn meta(&self) -> Value {
        json!({
            "status": self.status,
            "ok": self.ok,
            "url": self.url,
            "method": self.method,
        })
    }
}

#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    site: String,
    subdomain: String,
    defaults: RequestPolicy,
    logger: Logger,
}

impl HttpExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        logger: Logger,
    ) -> Self {
        Self {
            transport,
            credentials,
            site: DEFAULT_SITE.to_string(),
            subdomain: DEFAULT_SUBDOMAIN.to_string(),
            defaults: RequestPolicy::default(),
            logger: logger.child("http"),
        }
    }

    pub fn with_site(mut self, site: &str, subdomain: &str) -> Self {
        self.site = site.to_string();
        self.subdomain = subdomain.to_string();
        self
    }

    pub fn with_defaults(mut self, defaults: RequestPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &RequestPolicy {
        &self.defaults
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub async fn execute(&self, call: &ApiCall) -> Result<RequestOutcome, ToolError> {
        self.execute_with(call, &self.defaults).await
    }

    pub async fn execute_with(
        &self,
        call: &ApiCall,
        policy: &RequestPolicy,
    ) -> Result<RequestOutcome, ToolError> {
        let (api_key, app_key) = self.credentials.require()?;

        let site = call
            .site
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.site);
        let subdomain = call
            .subdomain
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.subdomain);
        let url = resolve_url(
            &call.url_template,
            Some(site),
            Some(subdomain),
            &call.path,
            &call.query,
        )?;
        let method = call.method.trim().to_uppercase();
        let request = HttpRequest {
            method: method.clone(),
            url: url.to_string(),
            headers: merge_headers(api_key, app_key, &call.headers, policy.user_agent.as_deref()),
            body: encode_body(&method, call.body.as_ref())?,
        };

        let retry = &policy.retry;
        let mut retries: u32 = 0;
        loop {
            let attempt = retries + 1;
            self.logger.debug(
                "HTTP request",
                Some(&json!({
                    "method": request.method,
                    "url": request.url,
                    "attempt": attempt,
                    "headers": redact_headers(request.headers.iter().map(|(k, v)| (k, v))),
                })),
            );
            let attempt_result =
                tokio::time::timeout(policy.timeout, self.transport.send(request.clone())).await;
            let result = match attempt_result {
                Ok(inner) => inner,
                Err(_) => Err(ToolError::timeout(format!(
                    "Request timed out after {} ms",
                    policy.timeout.as_millis()
                ))
                .with_details(json!({"url": request.url, "method": request.method}))),
            };

            match result {
                Ok(response) => {
                    if retry.should_retry_status(response.status) && retries < retry.max_retries {
                        retries += 1;
                        let delay = retry.delay_for(
                            retries,
                            response.header("retry-after"),
                            chrono::Utc::now(),
                        );
                        self.logger.warn(
                            "HTTP retry",
                            Some(&json!({
                                "attempt": attempt,
                                "status": response.status,
                                "delay_ms": delay.as_millis() as u64,
                                "url": request.url,
                            })),
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Ok(normalize_response(response, &request, attempt));
                }
                Err(err) => {
                    if retry.retry_on_transport_error
                        && err.retryable
                        && retries < retry.max_retries
                    {
                        retries += 1;
                        let delay = retry.backoff_delay(retries);
                        self.logger.warn(
                            "HTTP retry after transport failure",
                            Some(&json!({
                                "attempt": attempt,
                                "error": redact_known(&err.message, &[api_key, app_key]),
                                "delay_ms": delay.as_millis() as u64,
                                "url": request.url,
                            })),
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Defaults first, then caller headers replacing defaults case-insensitively.
/// `User-Agent` is added only when the caller sent none.
pub fn merge_headers(
    api_key: &str,
    app_key: &str,
    caller: &BTreeMap<String, String>,
    user_agent: Option<&str>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
        (API_KEY_HEADER.to_string(), api_key.to_string()),
        (APP_KEY_HEADER.to_string(), app_key.to_string()),
    ];
    for (name, value) in caller {
        merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        merged.push((name.clone(), value.clone()));
    }
    let caller_has_agent = caller.keys().any(|k| k.eq_ignore_ascii_case("user-agent"));
    if let Some(agent) = user_agent.filter(|a| !a.is_empty()) {
        if !caller_has_agent {
            merged.push(("User-Agent".to_string(), agent.to_string()));
        }
    }
    merged
}

/// No body for GET/HEAD or null; strings go out verbatim.
pub fn encode_body(method: &str, body: Option<&Value>) -> Result<Option<String>, ToolError> {
    if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
        return Ok(None);
    }
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Ok(Some(serde_json::to_string(other)?)),
    }
}

fn normalize_response(
    response: HttpResponse,
    request: &HttpRequest,
    attempts: u32,
) -> RequestOutcome {
    let is_json = response
        .header("content-type")
        .map(|ct| ct.to_lowercase().contains("application/json"))
        .unwrap_or(false);
    let data = if is_json {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice::<Value>(&response.body).unwrap_or_else(|_| {
                let text = String::from_utf8_lossy(&response.body);
                json!({
                    "error": "Invalid JSON",
                    "body": truncate_utf8_prefix(&text, INVALID_JSON_SNIPPET_BYTES),
                })
            })
        }
    } else {
        Value::String(String::from_utf8_lossy(&response.body).into_owned())
    };
    RequestOutcome {
        status: response.status,
        ok: (200..300).contains(&response.status),
        headers: response.headers,
        data,
        url: request.url.clone(),
        method: request.method.clone(),
        attempts,
    }
}
