//! Prompt contracts: system prompt template and rendering
//!
//! The system prompt lists the registered tools and fixes the tool-call
//! markup the model must use.

mod prompts;

pub use prompts::{default_system_prompt_template, render_system_prompt, TOOLS_PLACEHOLDERS};
