pub mod filesystem;
pub mod memory;
pub mod sqlite;
pub mod tool_impls;
pub mod tool_trait;

pub use tool_impls::{create_tools, ToolRegistry, ToolSettings};
pub use tool_trait::{Tool, ToolError};
