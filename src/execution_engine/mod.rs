//! Execution engine: tool contract, registry and per-call context

pub mod errors;
pub mod tool_context;
pub mod tool_registry;

pub use errors::{RegistryError, ToolError};
pub use tool_context::{truncate_chars, ToolContext, DEFAULT_TRUNCATE_LIMIT};
pub use tool_registry::{optional_u64, required_str, Tool, ToolRegistry};
