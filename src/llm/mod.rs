//! LLM integration: adapters, stream decoding, tool-call extraction and
//! the multi-step chat loop
//!
//! Backends stream [`StreamEvent`]s; the chat loop renders them, pulls
//! tool calls out of the reply and feeds results back until the model
//! answers without asking for a tool.

pub mod adapters;
pub mod chat_loop;
pub mod contracts;
pub mod stream_events;
pub mod think;
pub mod tool_call;
pub mod types;

// Re-export main types
pub use types::{Conversation, Message, Role, UsageCounts};

pub use stream_events::{StreamEvent, ToolArgs};
pub use tool_call::{extract_tool_calls, format_tool_result, ToolCall};

pub use contracts::{default_system_prompt_template, render_system_prompt};

pub use adapters::{
    create_adapter, Adapter, AdapterError, AdapterSettings, ChatOptions, EventStream, LlmAdapter,
    Provider,
};

pub use chat_loop::{ChatLoop, TurnOutcome};
