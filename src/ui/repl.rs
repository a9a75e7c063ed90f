//! Interactive read-eval loop
//!
//! Reads a line, routes slash commands to [`Repl::execute_command`] and
//! everything else into a chat turn. Owns the conversation.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::llm::chat_loop::{ChatLoop, TurnOutcome, INTERRUPT_PENDING_NOTICE};
use crate::llm::types::Conversation;
use crate::logging::DebugLog;
use crate::ui::commands::{parse_command, render_help, usage_of, Command, UNKNOWN_COMMAND};
use crate::ui::prompt::{LinePrompter, Prompter};
use crate::ui::session::{context_json, write_context_dump, SessionError, SessionStore};

/// What the caller should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

/// REPL state: chat loop, conversation, session store, debug log
pub struct Repl {
    chat: ChatLoop,
    conversation: Conversation,
    system_prompt: String,
    sessions: SessionStore,
    debug: DebugLog,
}

/// Session errors that come from the filesystem get a context prefix;
/// validation errors are shown as they are.
fn session_failure(action: &str, err: &SessionError) -> String {
    match err {
        SessionError::Io(_) | SessionError::Json(_) => format!("Failed to {} session: {}", action, err),
        _ => err.to_string(),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

impl Repl {
    pub fn new(
        chat: ChatLoop,
        system_prompt: impl Into<String>,
        sessions: SessionStore,
        debug: DebugLog,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            conversation: Conversation::new(system_prompt.clone()),
            chat,
            system_prompt,
            sessions,
            debug,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn chat(&self) -> &ChatLoop {
        &self.chat
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug
    }

    /// Run until `exit`, `/exit` or end of input
    ///
    /// Prompts and answers go through `prompter`; everything else is
    /// written to `out`.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        prompter: &mut LinePrompter<R, W>,
        out: &mut dyn Write,
        initial_message: Option<String>,
    ) -> io::Result<()> {
        tracing::debug!(event = "system_prompt", content = %self.system_prompt);
        if let Some(message) = initial_message.filter(|m| !m.trim().is_empty()) {
            self.submit(&message, prompter, out);
        }

        let label = format!("{} ", self.chat.renderer().user_label());
        loop {
            if self.chat.cancellation().take_notice() {
                writeln!(out, "{}", INTERRUPT_PENDING_NOTICE)?;
            }
            out.flush()?;
            let Some(line) = prompter.read_line(&label)? else {
                writeln!(out, "\nExiting.")?;
                return Ok(());
            };
            match parse_command(&line) {
                Command::None => continue,
                Command::Chat(text) => {
                    self.submit(&text, prompter, out);
                }
                command => {
                    tracing::debug!(event = "command", command = %line.trim());
                    if self.execute_command(command, out)? == CommandOutcome::Exit {
                        writeln!(out, "Bye.")?;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Append a user message and run a turn
    pub fn submit(
        &mut self,
        text: &str,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> TurnOutcome {
        tracing::debug!(event = "message", role = "user", content = %text);
        self.conversation.push_user(text);
        self.chat.run_turn(&mut self.conversation, prompter, out)
    }

    /// Execute a parsed command
    pub fn execute_command(
        &mut self,
        command: Command,
        out: &mut dyn Write,
    ) -> io::Result<CommandOutcome> {
        match command {
            Command::None => {}
            Command::Exit => return Ok(CommandOutcome::Exit),
            Command::Help => writeln!(out, "{}", render_help())?,
            Command::Info => self.show_info(out)?,
            Command::ListSessions => self.list_sessions(out)?,
            Command::Load(name) => match self.sessions.load(&name, &self.system_prompt) {
                Ok((path, conversation)) => {
                    self.conversation = conversation;
                    writeln!(
                        out,
                        "Session loaded from {}. Conversation length: {} messages.",
                        path.display(),
                        self.conversation.len()
                    )?;
                }
                Err(e) => writeln!(out, "{}", session_failure("load", &e))?,
            },
            Command::Remove(name) => match self.sessions.remove(&name) {
                Ok(path) => writeln!(out, "Removed session file {}", path.display())?,
                Err(e) => writeln!(out, "{}", session_failure("remove", &e))?,
            },
            Command::Save(name) => match self.sessions.save(&name, &self.conversation) {
                Ok(path) => writeln!(out, "Session saved to {}", path.display())?,
                Err(e) => writeln!(out, "{}", session_failure("save", &e))?,
            },
            Command::Tail(count) => self.show_tail(count, out)?,
            Command::Debug(None) => writeln!(
                out,
                "Debug logging is {}. Log file: {}",
                on_off(self.debug.is_enabled()),
                self.debug.path().display()
            )?,
            Command::Debug(Some(enabled)) => self.set_debug(enabled, out)?,
            Command::DebugTool { name, args } => self.debug_tool(&name, &args, out)?,
            Command::Truncate(enabled) => {
                self.chat.tool_context_mut().truncate_enabled = enabled;
                tracing::debug!(event = "truncate", enabled);
                writeln!(
                    out,
                    "Tool output truncation {}.",
                    if enabled { "enabled" } else { "disabled" }
                )?;
            }
            Command::Slomo(None) => {
                let delay = self.chat.slomo();
                if delay.is_zero() {
                    writeln!(out, "SloMo is disabled.")?;
                } else {
                    writeln!(
                        out,
                        "SloMo delay is {} seconds between model calls.",
                        delay.as_secs_f64()
                    )?;
                }
            }
            Command::Slomo(Some(seconds)) => match Duration::try_from_secs_f64(seconds) {
                Ok(delay) => {
                    self.chat.set_slomo(delay);
                    tracing::debug!(event = "slomo", seconds);
                    if delay.is_zero() {
                        writeln!(out, "SloMo disabled.")?;
                    } else {
                        writeln!(
                            out,
                            "SloMo delay set to {} seconds between model calls.",
                            seconds
                        )?;
                    }
                }
                Err(_) => writeln!(out, "Usage: {}", usage_of("slomo"))?,
            },
            Command::Unsafe(None) => writeln!(
                out,
                "Unsafe mode is {}.",
                on_off(self.chat.tool_context().unsafe_paths)
            )?,
            Command::Unsafe(Some(enabled)) => {
                self.chat.tool_context_mut().unsafe_paths = enabled;
                tracing::debug!(event = "unsafe", enabled);
                writeln!(
                    out,
                    "Unsafe mode {}.",
                    if enabled { "enabled" } else { "disabled" }
                )?;
            }
            Command::ContextDump(None) => match context_json(&self.conversation) {
                Ok(json) => writeln!(out, "{}", json)?,
                Err(e) => writeln!(out, "Failed to write context dump: {}", e)?,
            },
            Command::ContextDump(Some(target)) => {
                match write_context_dump(&target, &self.conversation) {
                    Ok(path) => writeln!(out, "Context dumped to {}", path.display())?,
                    Err(e) => writeln!(out, "Failed to write context dump: {}", e)?,
                }
            }
            Command::Usage(usage) => writeln!(out, "Usage: {}", usage)?,
            Command::Unknown => writeln!(out, "{}", UNKNOWN_COMMAND)?,
            Command::Chat(_) => {}
        }
        Ok(CommandOutcome::Continue)
    }

    fn show_info(&self, out: &mut dyn Write) -> io::Result<()> {
        let totals = self.conversation.usage_totals();
        let ctx = self.chat.tool_context();
        writeln!(out, "Provider: {}", self.chat.provider_name())?;
        writeln!(out, "Model: {}", self.chat.model())?;
        writeln!(out, "Messages in session: {}", self.conversation.len())?;
        if totals.total > 0 {
            writeln!(out, "Prompt tokens: {}", totals.prompt)?;
            writeln!(out, "Completion tokens: {}", totals.completion)?;
            writeln!(out, "Total tokens: {}", totals.total)?;
        } else {
            writeln!(out, "Approximate tokens: {}", self.conversation.estimate_tokens())?;
        }
        if ctx.truncate_enabled {
            writeln!(out, "Truncation: on (limit: {} chars)", ctx.truncate_limit)?;
        } else {
            writeln!(out, "Truncation: off")?;
        }
        writeln!(
            out,
            "Debug: {} (log file: {})",
            on_off(self.debug.is_enabled()),
            self.debug.path().display()
        )?;
        writeln!(out, "Unsafe mode: {}", on_off(ctx.unsafe_paths))
    }

    fn list_sessions(&self, out: &mut dyn Write) -> io::Result<()> {
        let entries = match self.sessions.list() {
            Ok(entries) => entries,
            Err(e) => return writeln!(out, "{}", session_failure("list", &e)),
        };
        if entries.is_empty() {
            return writeln!(out, "No saved sessions found.");
        }
        writeln!(out, "Saved sessions in {}:", self.sessions.dir().display())?;
        for entry in entries {
            match entry.modified {
                Some(modified) => writeln!(
                    out,
                    "  {}  ({} bytes, {})",
                    entry.file_name,
                    entry.size,
                    modified.format("%Y-%m-%d %H:%M")
                )?,
                None => writeln!(out, "  {}  ({} bytes)", entry.file_name, entry.size)?,
            }
        }
        Ok(())
    }

    fn show_tail(&self, count: usize, out: &mut dyn Write) -> io::Result<()> {
        let messages = self.conversation.messages();
        if messages.is_empty() {
            return writeln!(out, "Conversation is empty.");
        }
        let start = messages.len().saturating_sub(count);
        for message in &messages[start..] {
            writeln!(
                out,
                "[{}] {}",
                message.role.as_str().to_uppercase(),
                message.content
            )?;
        }
        Ok(())
    }

    fn set_debug(&mut self, enabled: bool, out: &mut dyn Write) -> io::Result<()> {
        let was_enabled = self.debug.is_enabled();
        if let Err(e) = self.debug.set_enabled(enabled) {
            return writeln!(out, "[warning] {}", e);
        }
        writeln!(
            out,
            "Debug logging {}. Log file: {}",
            if enabled { "enabled" } else { "disabled" },
            self.debug.path().display()
        )?;
        if enabled && !was_enabled {
            let snapshot = context_json(&self.conversation).unwrap_or_default();
            tracing::debug!(event = "conversation_snapshot", messages = %snapshot);
        }
        Ok(())
    }

    fn debug_tool(&self, name: &str, raw_args: &str, out: &mut dyn Write) -> io::Result<()> {
        let args = match serde_json::from_str::<JsonValue>(raw_args) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) => return writeln!(out, "Tool arguments must be a JSON object."),
            Err(e) => {
                return writeln!(
                    out,
                    "Invalid JSON: {}. Example: {{\"query\": \"example\"}}",
                    e
                )
            }
        };
        let result = self
            .chat
            .registry()
            .execute(name, &args, self.chat.tool_context());
        tracing::debug!(event = "debug_tool", name, result = %result);
        writeln!(out, "[tool {}]", name)?;
        writeln!(out, "{}", result)
    }
}
