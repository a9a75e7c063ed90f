//! Chat loop: multi-step tool execution
//!
//! Runs on the caller's thread. Each turn blocks on the network stream,
//! the approval prompt and tool subprocesses in turn; nothing runs
//! concurrently except the interrupt flag being set.
//!
//! # Flow
//!
//! 1. User message is already appended by the caller
//! 2. Stream the model response and render it as it arrives
//! 3. Append the assistant message (usage recorded)
//! 4. Extract tool calls (native calls take precedence over markup)
//! 5. For each call: approval gate, then execute or record the denial
//! 6. Append each result as a user message and stream again
//! 7. No tool calls: turn complete

mod chat_loop;
mod event_handler;
mod loop_state;

// Re-export public API
pub use chat_loop::{
    ChatLoop, EMPTY_RESPONSE_WARNING, INTERRUPT_ACKNOWLEDGED, INTERRUPT_PENDING_NOTICE,
};
pub use event_handler::Reply;
pub use loop_state::{TurnOutcome, TurnPhase, TurnState, TurnStats};
