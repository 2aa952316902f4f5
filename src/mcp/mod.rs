pub mod catalog;
pub mod protocol;
pub mod server;

pub use catalog::ToolCatalog;
pub use server::McpServer;
