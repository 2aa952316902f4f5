pub mod document;
pub mod index;
pub mod naming;
pub mod schema;

pub use document::{Collection, RequestTemplate};
pub use index::{CategoryFilter, IndexBuilder, Operation, OperationIndex};
pub use naming::{NameOverride, NamingRules};
pub use schema::{project_tool, ToolDescriptor};
