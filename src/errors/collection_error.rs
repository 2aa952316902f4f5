use crate::errors::ToolError;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a collection document is rejected before any tool is derived.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read collection {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("collection is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid collection: missing info")]
    MissingInfo,
    #[error("invalid collection: missing item array")]
    MissingItems,
    #[error("collection has no items")]
    EmptyItems,
}

impl From<CollectionError> for ToolError {
    fn from(err: CollectionError) -> Self {
        let hint = match &err {
            CollectionError::NotFound(_) | CollectionError::Read { .. } => {
                Some("Point MCP_DD_SCHEMA_PATH or --schema at the Datadog Postman collection.")
            }
            _ => None,
        };
        let out = ToolError::precondition(err.to_string());
        match hint {
            Some(hint) => out.with_hint(hint),
            None => out,
        }
    }
}
