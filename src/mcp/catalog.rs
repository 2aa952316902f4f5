use crate::collection::ToolDescriptor;
use crate::constants::limits::MAX_SUGGESTIONS;
use crate::errors::{ErrorCode, McpError};
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;

const MAX_RENDERED_ERRORS: usize = 10;

/// Advertised tools plus their compiled argument validators.
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    positions: HashMap<String, usize>,
    validators: HashMap<String, JSONSchema>,
}

impl ToolCatalog {
    /// Tools whose schema fails to compile stay listed but are not validated.
    pub fn new(tools: Vec<ToolDescriptor>, logger: &Logger) -> Self {
        let mut positions = HashMap::new();
        let mut validators = HashMap::new();
        for (idx, tool) in tools.iter().enumerate() {
            positions.insert(tool.name.clone(), idx);
            match JSONSchema::compile(&tool.input_schema) {
                Ok(compiled) => {
                    validators.insert(tool.name.clone(), compiled);
                }
                Err(err) => logger.warn(
                    "Tool schema does not compile",
                    Some(&serde_json::json!({"tool": tool.name, "error": err.to_string()})),
                ),
            }
        }
        Self {
            tools,
            positions,
            validators,
        }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.positions.get(name).map(|idx| &self.tools[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_result(&self) -> Value {
        serde_json::json!({ "tools": self.tools })
    }

    pub fn unknown_tool(&self, name: &str) -> McpError {
        let names: Vec<String> = self.tools.iter().map(|t| t.name.clone()).collect();
        let suggestions = suggest(name, &names, MAX_SUGGESTIONS);
        let mut message = format!("Unknown tool: {}", name);
        if !suggestions.is_empty() {
            message.push_str(&format!(". Did you mean: {}", suggestions.join(", ")));
        }
        McpError::new(ErrorCode::InvalidParams, message)
    }

    pub fn validate(&self, name: &str, args: &Value) -> Result<(), McpError> {
        let Some(tool) = self.get(name) else {
            return Err(self.unknown_tool(name));
        };
        let Some(validator) = self.validators.get(name) else {
            return Ok(());
        };
        if let Err(errors) = validator.validate(args) {
            let message = format_schema_errors(name, args, errors, &tool.input_schema);
            return Err(McpError::new(ErrorCode::InvalidParams, message));
        }
        Ok(())
    }
}

fn format_schema_errors(
    tool_name: &str,
    args: &Value,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let mut rendered = Vec::new();
    let mut did_you_means = Vec::new();

    for err in errors.take(MAX_RENDERED_ERRORS) {
        let pointer = err.instance_path.to_string();
        let at = if pointer.is_empty() {
            "(root)".to_string()
        } else {
            pointer.clone()
        };
        match &err.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                let known: Vec<String> = schema_parent_at(schema, &err.schema_path.to_string())
                    .and_then(|parent| parent.get("properties").and_then(Value::as_object).cloned())
                    .map(|props| props.keys().cloned().collect())
                    .unwrap_or_default();
                for unknown in unexpected {
                    rendered.push(format!("{}: unknown field '{}'", at, unknown));
                    let suggestions = suggest(unknown, &known, MAX_SUGGESTIONS);
                    if !suggestions.is_empty() {
                        did_you_means.push(format!("'{}' -> {}", unknown, suggestions.join(", ")));
                    }
                }
            }
            ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| {
                                v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                rendered.push(format!("{}: expected one of {}", at, allowed.join(", ")));
                let received = value_at(args, &pointer);
                let suggestions =
                    suggest(received.as_str().unwrap_or(""), &allowed, MAX_SUGGESTIONS);
                if !suggestions.is_empty() {
                    did_you_means.push(format!("{} -> {}", at, suggestions.join(", ")));
                }
            }
            ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                rendered.push(format!("{}: missing required field '{}'", at, prop));
            }
            ValidationErrorKind::Type { kind } => {
                rendered.push(format!("{}: expected {}", at, format_type_kind(kind)));
            }
            _ => rendered.push(format!("{}: {}", at, err)),
        }
    }

    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    lines.extend(rendered.iter().map(|line| format!("- {}", line)));
    if !did_you_means.is_empty() {
        lines.push(format!("Did you mean: {}", did_you_means.join(" | ")));
    }
    lines.join("\n")
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}

/// Schema node owning the keyword at the end of `schema_path`.
fn schema_parent_at<'a>(schema: &'a Value, schema_path: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = schema_path.split('/').filter(|s| !s.is_empty()).collect();
    let (_, parents) = segments.split_last()?;
    let mut current = schema;
    for segment in parents {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn value_at<'a>(root: &'a Value, instance_path: &str) -> &'a Value {
    let mut current = root;
    for segment in instance_path.split('/').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment).unwrap_or(&Value::Null),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .unwrap_or(&Value::Null),
            _ => &Value::Null,
        };
    }
    current
}
