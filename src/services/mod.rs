pub mod config;
pub mod docs;
pub mod logger;
pub mod smoke;
pub mod tool_executor;
