use crate::collection::Operation;
use crate::errors::ToolError;
use crate::http::template::render_scalar;
use crate::http::{ApiCall, HttpExecutor, RequestPolicy};
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-call policy keys; each accepted in snake_case and camelCase.
const TIMEOUT_KEYS: &[&str] = &["timeout_ms", "timeoutMs"];
const MAX_RETRIES_KEYS: &[&str] = &["max_retries", "maxRetries"];
const RETRY_BASE_KEYS: &[&str] = &["retry_base_ms", "retryBaseMs"];
const RETRY_AFTER_KEYS: &[&str] = &["respect_retry_after", "respectRetryAfter"];
const USER_AGENT_KEYS: &[&str] = &["user_agent", "userAgent"];

const STRUCTURAL_KEYS: &[&str] = &["path", "query", "body", "headers", "site", "subdomain"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_ms: Option<u64>,
    pub respect_retry_after: Option<bool>,
    pub user_agent: Option<String>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, base: &RequestPolicy) -> RequestPolicy {
        let mut out = base.clone();
        if let Some(ms) = self.timeout_ms {
            out.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            out.retry.max_retries = retries;
        }
        if let Some(base_ms) = self.retry_base_ms {
            out.retry.base_delay_ms = base_ms;
        }
        if let Some(respect) = self.respect_retry_after {
            out.retry.respect_retry_after = respect;
        }
        if let Some(agent) = &self.user_agent {
            out.user_agent = Some(agent.clone());
        }
        out
    }
}

/// Arguments of a generated tool, split into request parts.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub site: Option<String>,
    pub subdomain: Option<String>,
    pub overrides: PolicyOverrides,
}

impl CallArgs {
    /// Unknown top-level keys are folded into `query`, overriding explicit
    /// entries of the same name; null values are dropped.
    pub fn parse(args: &Value) -> Result<Self, ToolError> {
        let obj = match args {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(ToolError::invalid_params("Arguments must be an object")),
        };

        let mut out = Self {
            path: optional_object(obj, "path")?,
            query: optional_object(obj, "query")?,
            body: obj.get("body").cloned().filter(|b| !b.is_null()),
            headers: optional_object(obj, "headers")?
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, render_scalar(&v)))
                .collect(),
            site: optional_string(obj, &["site"])?,
            subdomain: optional_string(obj, &["subdomain"])?,
            overrides: PolicyOverrides {
                timeout_ms: optional_u64(obj, TIMEOUT_KEYS)?,
                max_retries: optional_u64(obj, MAX_RETRIES_KEYS)?
                    .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
                retry_base_ms: optional_u64(obj, RETRY_BASE_KEYS)?,
                respect_retry_after: optional_bool(obj, RETRY_AFTER_KEYS)?,
                user_agent: optional_string(obj, USER_AGENT_KEYS)?,
            },
        };

        for (key, value) in obj {
            if is_reserved(key) || value.is_null() {
                continue;
            }
            out.query.insert(key.clone(), value.clone());
        }
        Ok(out)
    }

    pub fn into_call(self, op: &Operation) -> (ApiCall, PolicyOverrides) {
        let call = ApiCall {
            method: op.method.clone(),
            url_template: op.raw_url_template.clone(),
            path: self.path,
            query: self.query,
            body: self.body,
            headers: self.headers,
            site: self.site,
            subdomain: self.subdomain,
        };
        (call, self.overrides)
    }
}

fn is_reserved(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
        || [
            TIMEOUT_KEYS,
            MAX_RETRIES_KEYS,
            RETRY_BASE_KEYS,
            RETRY_AFTER_KEYS,
            USER_AGENT_KEYS,
        ]
        .iter()
        .any(|keys| keys.contains(&key))
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
    keys.iter().find_map(|key| {
        obj.get_key_value(*key)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

fn optional_object(obj: &Map<String, Value>, key: &str) -> Result<Map<String, Value>, ToolError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ToolError::invalid_params(format!("{} must be an object", key))),
    }
}

fn optional_string(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>, ToolError> {
    match first(obj, keys) {
        None => Ok(None),
        Some((_, Value::String(text))) => Ok(Some(text.clone())),
        Some((key, _)) => Err(ToolError::invalid_params(format!("{} must be a string", key))),
    }
}

fn optional_u64(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<u64>, ToolError> {
    match first(obj, keys) {
        None => Ok(None),
        Some((key, value)) => value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
            .map(Some)
            .ok_or_else(|| {
                ToolError::invalid_params(format!("{} must be a non-negative integer", key))
            }),
    }
}

fn optional_bool(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<bool>, ToolError> {
    match first(obj, keys) {
        None => Ok(None),
        Some((_, Value::Bool(flag))) => Ok(Some(*flag)),
        Some((key, _)) => Err(ToolError::invalid_params(format!("{} must be a boolean", key))),
    }
}

/// Handler behind every generated tool.
pub struct OperationHandler {
    operation: Operation,
    executor: Arc<HttpExecutor>,
}

impl OperationHandler {
    pub fn new(operation: Operation, executor: Arc<HttpExecutor>) -> Self {
        Self {
            operation,
            executor,
        }
    }
}

#[async_trait]
impl ToolHandler for OperationHandler {
    async fn handle(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let (call, overrides) = CallArgs::parse(&args)?.into_call(&self.operation);
        let outcome = if overrides.is_empty() {
            self.executor.execute(&call).await?
        } else {
            let policy = overrides.apply(self.executor.defaults());
            self.executor.execute_with(&call, &policy).await?
        };
        Ok(ToolOutput::from_outcome(&outcome))
    }
}
