use crate::collection::index::Operation;
use crate::constants::limits::TOOL_DESCRIPTION_MAX_CHARS;
use crate::utils::text::truncate_chars;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The advertised form of a tool: what `tools/list` returns for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Permissive input schema shared by every generated operation. Unknown
/// top-level keys are accepted and later folded into the query string.
pub fn operation_input_schema(op: &Operation) -> Value {
    let path_description = if op.path_variables.is_empty() {
        "Optional map of path params".to_string()
    } else {
        format!("Path params: {}", op.path_variables.join(", "))
    };
    json!({
        "type": "object",
        "additionalProperties": true,
        "properties": {
            "path": {
                "type": "object",
                "description": path_description,
                "additionalProperties": true,
            },
            "query": {
                "type": "object",
                "description": "Optional querystring parameters",
                "additionalProperties": true,
            },
            "body": {
                "description": "Optional request body (object, array, or raw JSON string)",
                "oneOf": [
                    { "type": "object" },
                    { "type": "array" },
                    { "type": "string" },
                    { "type": "null" },
                ],
            },
            "headers": {
                "type": "object",
                "description": "Optional extra headers to include",
                "additionalProperties": true,
            },
            "site": {
                "type": "string",
                "description": "Datadog site (default from DD_SITE, e.g. datadoghq.com)",
            },
            "subdomain": {
                "type": "string",
                "description": "Subdomain for baseUrl (default 'api')",
            },
        },
    })
}

pub fn project_tool(op: &Operation) -> ToolDescriptor {
    let description = if op.description.trim().is_empty() {
        format!("{} {}", op.method, op.raw_url_template)
    } else {
        truncate_chars(&op.description, TOOL_DESCRIPTION_MAX_CHARS)
    };
    ToolDescriptor {
        name: op.name.clone(),
        description,
        input_schema: operation_input_schema(op),
    }
}
