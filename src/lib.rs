//! clia: interactive command-line agent
//!
//! Streams model output from Ollama or OpenAI-compatible backends, pulls
//! tool calls out of the reply, asks the user before running each one and
//! feeds the results back until the model answers on its own.

pub mod cli;
pub mod execution_engine;
pub mod file_tools;
pub mod llm;
pub mod logging;
pub mod os_tools;
pub mod ui;
pub mod web_tools;

// Re-export the pieces an embedder needs
pub use execution_engine::{Tool, ToolContext, ToolError, ToolRegistry};
pub use llm::{Adapter, ChatLoop, Conversation, StreamEvent, ToolCall, TurnOutcome};
pub use ui::{ApprovalGate, CancellationToken, Repl};
