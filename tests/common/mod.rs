#![allow(dead_code)]

use async_trait::async_trait;
use datadog_mcp::collection::Collection;
use datadog_mcp::errors::ToolError;
use datadog_mcp::http::{Credentials, HttpRequest, HttpResponse, HttpTransport};
use datadog_mcp::services::config::Config;
use datadog_mcp::services::logger::{LogLevel, Logger};
use once_cell::sync::Lazy;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn quiet_logger() -> Logger {
    let mut logger = Logger::new("test");
    logger.set_level(LogLevel::Error);
    logger
}

pub fn test_config() -> Config {
    Config {
        credentials: Credentials::new(
            Some("api-key-0123456".to_string()),
            Some("app-key-6543210".to_string()),
        ),
        retry_base_ms: 100,
        ..Config::default()
    }
}

/// Small collection covering folders, declared variables, the log intake
/// host and a cross-version name collision.
pub fn fixture_collection() -> Collection {
    Collection::from_value(json!({
        "info": {"name": "Datadog API Collection"},
        "item": [
            {
                "name": "Monitors",
                "item": [
                    {
                        "name": "Get all monitor details",
                        "request": {"method": "GET", "url": {"raw": "{{baseUrl}}/api/v1/monitor?group_states=alert"}}
                    },
                    {
                        "name": "Get a monitor's details",
                        "description": "Get details about the specified monitor.",
                        "request": {
                            "method": "GET",
                            "url": {
                                "raw": "{{baseUrl}}/api/v1/monitor/:monitor_id",
                                "variable": [{"key": "monitor_id"}]
                            }
                        }
                    },
                    {
                        "name": "Create a monitor",
                        "request": {"method": "POST", "url": "{{baseUrl}}/api/v1/monitor"}
                    }
                ]
            },
            {
                "name": "Logs",
                "item": [
                    {
                        "name": "Search logs",
                        "request": {"method": "POST", "url": {"raw": "{{baseUrl}}/api/v2/logs/events/search"}}
                    },
                    {
                        "name": "Send logs",
                        "request": {"method": "POST", "url": {"raw": "https://http-intake.logs.{{site}}/api/v2/logs"}}
                    }
                ]
            },
            {
                "name": "Hosts",
                "item": [
                    {"name": "Get hosts v1", "request": {"method": "GET", "url": "{{baseUrl}}/api/v1/hosts"}},
                    {"name": "Get hosts v2", "request": {"method": "GET", "url": "{{baseUrl}}/api/v2/hosts"}}
                ]
            }
        ]
    }))
    .expect("fixture collection is valid")
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub request: HttpRequest,
    pub at: Instant,
}

/// Transport that replays queued responses and records every request with
/// its (possibly paused) tokio timestamp.
#[derive(Default)]
pub struct MockTransport {
    responses: StdMutex<VecDeque<Result<HttpResponse, ToolError>>>,
    fallback: Option<HttpResponse>,
    recorded: StdMutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Served once the queue is empty.
    pub fn always(response: HttpResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::default()
        }
    }

    pub fn push(&self, response: HttpResponse) -> &Self {
        self.responses.lock().expect("queue").push_back(Ok(response));
        self
    }

    pub fn push_error(&self, err: ToolError) -> &Self {
        self.responses.lock().expect("queue").push_back(Err(err));
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().expect("recorded").clone()
    }

    pub fn calls(&self) -> usize {
        self.recorded.lock().expect("recorded").len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        self.recorded.lock().expect("recorded").push(Recorded {
            request,
            at: Instant::now(),
        });
        let next = self.responses.lock().expect("queue").pop_front();
        match next {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ToolError::internal("mock transport has no queued response")),
        }
    }
}
