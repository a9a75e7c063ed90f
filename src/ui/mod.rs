//! Terminal surface
//!
//! Line-oriented, no alternate screen. Everything the user types or
//! answers goes through a [`Prompter`], so the REPL and the approval
//! gate can be driven by scripted input in tests.

pub mod approval;
pub mod cancel;
pub mod commands;
pub mod prompt;
pub mod render;
pub mod repl;
pub mod session;

// Re-exports
pub use approval::{denial_message, ApprovalDecision, ApprovalGate, DENIAL_MESSAGE};
pub use cancel::{install_sigint_handler, CancellationToken, SigintGuard, INTERRUPT_EXIT_CODE};
pub use commands::{parse_command, render_help, Command};
pub use prompt::{ApprovalResponse, InterruptChoice, LinePrompter, Prompter, ScriptedPrompter};
pub use render::Renderer;
pub use repl::{CommandOutcome, Repl};
pub use session::{SessionError, SessionStore};
