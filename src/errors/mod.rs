mod collection_error;
mod mcp_error;
mod tool_error;

pub use collection_error::CollectionError;
pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::{ToolError, ToolErrorKind};
