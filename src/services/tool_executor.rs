use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::constants::limits::MAX_SUGGESTIONS;
use crate::errors::ToolError;
use crate::http::RequestOutcome;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
}

impl ContentPart {
    pub fn text(&self) -> &str {
        match self {
            ContentPart::Text { text } => text,
        }
    }
}

/// What a tool call hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<ContentPart>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text { text: text.into() }],
            is_error: true,
        }
    }

    pub fn failure(err: &ToolError) -> Self {
        let mut text = format!("Request failed: {}", err.message);
        if let Some(hint) = &err.hint {
            text.push_str(&format!("\nHint: {}", hint));
        }
        Self::error_text(text)
    }

    /// Meta line plus the body; a non-2xx outcome is flagged as an error.
    pub fn from_outcome(outcome: &RequestOutcome) -> Self {
        let meta = outcome.meta().to_string();
        Self {
            content: vec![
                ContentPart::Text { text: meta },
                ContentPart::Text {
                    text: pretty_data(&outcome.data),
                },
            ],
            is_error: !outcome.ok,
        }
    }
}

pub fn pretty_data(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<ToolOutput, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn unknown_tool(&self, tool: &str) -> ToolError {
        let suggestions = suggest(tool, &self.names(), MAX_SUGGESTIONS);
        let mut err = ToolError::not_found(format!("Unknown tool: {}", tool));
        if !suggestions.is_empty() {
            err = err.with_hint(format!("Did you mean: {}", suggestions.join(", ")));
        }
        err.with_details(serde_json::json!({ "suggestions": suggestions }))
    }

    /// Runs one call. Only an unknown tool name is an `Err`; everything that
    /// goes wrong inside a handler comes back as an error result.
    pub async fn execute(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let handler = self
            .handlers
            .get(tool)
            .cloned()
            .ok_or_else(|| self.unknown_tool(tool))?;

        let call_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        self.logger.debug(
            "Tool call started",
            Some(&serde_json::json!({"tool": tool, "call_id": call_id})),
        );

        let output = match handler.handle(args).await {
            Ok(output) => output,
            Err(err) => {
                self.logger.warn(
                    "Tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "call_id": call_id,
                        "kind": err.kind,
                        "message": err.message,
                    })),
                );
                ToolOutput::failure(&err)
            }
        };

        self.logger.debug(
            "Tool call finished",
            Some(&serde_json::json!({
                "tool": tool,
                "call_id": call_id,
                "is_error": output.is_error,
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::logger::LogLevel;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(args.to_string()))
        }
    }

    struct Broken;

    #[async_trait]
    impl ToolHandler for Broken {
        async fn handle(&self, _args: Value) -> Result<ToolOutput, ToolError> {
            Err(ToolError::precondition("Missing Datadog credentials"))
        }
    }

    fn executor() -> ToolExecutor {
        let mut logger = Logger::new("test");
        logger.set_level(LogLevel::Error);
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("get_monitors".to_string(), Arc::new(Echo));
        handlers.insert("get_hosts".to_string(), Arc::new(Broken));
        ToolExecutor::new(logger, handlers)
    }

    #[tokio::test]
    async fn handler_errors_become_error_results() {
        let out = executor()
            .execute("get_hosts", serde_json::json!({}))
            .await
            .expect("dispatched");
        assert!(out.is_error);
        assert_eq!(
            out.content[0].text(),
            "Request failed: Missing Datadog credentials"
        );
    }

    #[tokio::test]
    async fn unknown_tool_suggests_names() {
        let err = executor()
            .execute("get_monitor", serde_json::json!({}))
            .await
            .expect_err("unknown");
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.hint.unwrap_or_default().contains("get_monitors"));
    }

    #[test]
    fn output_serializes_with_is_error_key() {
        let value = serde_json::to_value(ToolOutput::text("hi")).expect("serialize");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["isError"], false);
    }
}
