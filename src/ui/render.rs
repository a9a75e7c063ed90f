//! Terminal rendering
//!
//! Plain line output with optional ANSI colors (crossterm). Think
//! segments are shown in grey but stored verbatim in the conversation.

use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::llm::stream_events::StreamEvent;

/// Tool whose output is mirrored live, so only its status line is repeated
const STREAMED_TOOL: &str = "run_shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    use_color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn user_label(&self) -> String {
        if self.use_color {
            "you>".yellow().to_string()
        } else {
            "you>".to_string()
        }
    }

    pub fn agent_label(&self) -> String {
        if self.use_color {
            "agent>".cyan().to_string()
        } else {
            "agent>".to_string()
        }
    }

    pub fn thinking(&self, text: &str) -> String {
        if self.use_color && !text.is_empty() {
            text.dark_grey().to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the visible part of one stream event
    pub fn stream_event(&self, out: &mut dyn Write, event: &StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::ContentDelta(text) => write!(out, "{}", text)?,
            StreamEvent::ThinkingDelta(text) => write!(out, "{}", self.thinking(text))?,
            _ => return Ok(()),
        }
        out.flush()
    }

    /// Show a tool result to the user
    ///
    /// `run_shell` output was already mirrored while the command ran, so
    /// only its first line (the exit status) is repeated.
    pub fn tool_result(&self, out: &mut dyn Write, tool: &str, output: &str) -> io::Result<()> {
        if tool == STREAMED_TOOL && !output.is_empty() {
            let mut lines = output.lines();
            writeln!(out, "[tool result]")?;
            writeln!(out, "{}", lines.next().unwrap_or(""))?;
            if lines.next().is_some() {
                writeln!(out, "(output streamed above; remaining lines delivered to the model)")?;
            }
            return writeln!(out);
        }
        writeln!(out, "[tool result]\n{}\n", output)
    }
}
