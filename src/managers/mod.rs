pub mod curated;
pub mod operation;

pub use curated::{CuratedHandler, CuratedTool, CURATED_TOOLS};
pub use operation::{CallArgs, OperationHandler, PolicyOverrides};
