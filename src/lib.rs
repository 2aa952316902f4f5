pub mod app;
pub mod collection;
pub mod constants;
pub mod errors;
pub mod http;
pub mod managers;
pub mod mcp;
pub mod services;
pub mod utils;
