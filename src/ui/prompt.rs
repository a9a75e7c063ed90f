//! Interactive prompts
//!
//! Everything the agent asks the human goes through the [`Prompter`]
//! trait: tool approval, the optional denial reason, and the interrupt
//! continue/abort choice. `LinePrompter` reads answers line by line from
//! any `BufRead`; `ScriptedPrompter` replays canned answers in tests.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, BufRead, Write};

use crate::llm::tool_call::ToolCall;

pub const APPROVAL_PROMPT: &str = "Allow this tool? [y]es/[n]o/[a]lways: ";
pub const REASON_PROMPT: &str = "Provide optional reason for the model (press Enter to skip): ";
pub const INTERRUPT_PROMPT: &str = "Interrupt detected. Continue? [c]ontinue/[a]bort: ";

/// Answer to a tool approval prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalResponse {
    /// Run this call only
    ApproveOnce,
    /// Run this call and never ask again for this tool name
    ApproveAlways,
    /// Do not run this call
    Deny,
}

/// Answer to the interrupt prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptChoice {
    Continue,
    Abort,
}

/// Parse an approval answer (`y`, `n`, `a`), case-insensitive
pub fn parse_approval(input: &str) -> Option<ApprovalResponse> {
    match input.trim().to_lowercase().as_str() {
        "y" => Some(ApprovalResponse::ApproveOnce),
        "n" => Some(ApprovalResponse::Deny),
        "a" => Some(ApprovalResponse::ApproveAlways),
        _ => None,
    }
}

/// Parse an interrupt answer; an empty line means continue
pub fn parse_interrupt_choice(input: &str) -> Option<InterruptChoice> {
    match input.trim().to_lowercase().as_str() {
        "" | "c" | "continue" | "y" | "yes" => Some(InterruptChoice::Continue),
        "a" | "abort" | "n" | "no" => Some(InterruptChoice::Abort),
        _ => None,
    }
}

/// Source of human decisions
pub trait Prompter {
    /// Ask whether `call` may run
    fn approve_tool(&mut self, call: &ToolCall) -> ApprovalResponse;

    /// Ask for an optional reason after a denial
    fn denial_reason(&mut self) -> Option<String>;

    /// Ask whether to continue after an interrupt
    fn interrupt_choice(&mut self) -> InterruptChoice;

    /// Show an out-of-band message (warnings, acknowledgements)
    fn notify(&mut self, message: &str);
}

/// Line-oriented prompter over a reader/writer pair
///
/// End of input counts as the conservative answer: deny, no reason,
/// abort.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line without its terminator
    ///
    /// Returns `Ok(None)` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
    }

    fn show_request(&mut self, call: &ToolCall) {
        let sorted: BTreeMap<&String, &serde_json::Value> = call.arguments.iter().collect();
        let pretty =
            serde_json::to_string_pretty(&sorted).unwrap_or_else(|_| call.arguments_json());
        self.say("Requested tool execution:");
        self.say(&format!("  name: {}", call.name));
        self.say("  args:");
        for line in pretty.lines() {
            self.say(&format!("    {}", line));
        }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn approve_tool(&mut self, call: &ToolCall) -> ApprovalResponse {
        self.show_request(call);
        loop {
            match self.read_line(APPROVAL_PROMPT) {
                Ok(Some(answer)) => match parse_approval(&answer) {
                    Some(response) => return response,
                    None => self.say("Please respond with 'y', 'n', or 'a'."),
                },
                Ok(None) | Err(_) => return ApprovalResponse::Deny,
            }
        }
    }

    fn denial_reason(&mut self) -> Option<String> {
        match self.read_line(REASON_PROMPT) {
            Ok(Some(reason)) => {
                let reason = reason.trim();
                (!reason.is_empty()).then(|| reason.to_string())
            }
            _ => None,
        }
    }

    fn interrupt_choice(&mut self) -> InterruptChoice {
        loop {
            match self.read_line(INTERRUPT_PROMPT) {
                Ok(Some(answer)) => match parse_interrupt_choice(&answer) {
                    Some(choice) => return choice,
                    None => self.say("Please respond with 'c' to continue or 'a' to abort."),
                },
                Ok(None) | Err(_) => return InterruptChoice::Abort,
            }
        }
    }

    fn notify(&mut self, message: &str) {
        self.say(message);
    }
}

/// Prompter answering from queues, for tests and non-interactive runs
///
/// Exhausted queues fall back to deny / no reason / abort.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    approvals: VecDeque<ApprovalResponse>,
    reasons: VecDeque<Option<String>>,
    interrupts: VecDeque<InterruptChoice>,
    /// Tool names the prompter was asked about, in order
    pub approval_requests: Vec<String>,
    /// Number of interrupt prompts shown
    pub interrupt_requests: usize,
    /// Messages passed to `notify`
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_approvals(mut self, approvals: impl IntoIterator<Item = ApprovalResponse>) -> Self {
        self.approvals.extend(approvals);
        self
    }

    pub fn with_reasons(mut self, reasons: impl IntoIterator<Item = Option<String>>) -> Self {
        self.reasons.extend(reasons);
        self
    }

    pub fn with_interrupts(mut self, choices: impl IntoIterator<Item = InterruptChoice>) -> Self {
        self.interrupts.extend(choices);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn approve_tool(&mut self, call: &ToolCall) -> ApprovalResponse {
        self.approval_requests.push(call.name.clone());
        self.approvals.pop_front().unwrap_or(ApprovalResponse::Deny)
    }

    fn denial_reason(&mut self) -> Option<String> {
        self.reasons.pop_front().flatten()
    }

    fn interrupt_choice(&mut self) -> InterruptChoice {
        self.interrupt_requests += 1;
        self.interrupts.pop_front().unwrap_or(InterruptChoice::Abort)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
