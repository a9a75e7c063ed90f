//! ChatLoop: the turn orchestrator
//!
//! One call to [`ChatLoop::run_turn`] drives a whole turn on the caller's
//! thread: stream a response, append it, run the tool calls it contains
//! (each behind the approval gate), append their results, and stream
//! again until the model answers without tool calls.
//!
//! Cancellation is polled at two safe points: right after the assistant
//! message is appended, and before each tool call.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crate::execution_engine::{ToolContext, ToolRegistry};
use crate::llm::adapters::{Adapter, AdapterError, ChatOptions, LlmAdapter};
use crate::llm::tool_call::{format_tool_result, ToolCall};
use crate::llm::types::Conversation;
use crate::ui::approval::{denial_message, ApprovalDecision, ApprovalGate};
use crate::ui::cancel::CancellationToken;
use crate::ui::prompt::{InterruptChoice, Prompter};
use crate::ui::render::Renderer;

use super::event_handler::Reply;
use super::loop_state::{TurnOutcome, TurnPhase, TurnState};

pub const EMPTY_RESPONSE_WARNING: &str =
    "[warning] Model returned an empty response; retry or check logs.";
pub const INTERRUPT_PENDING_NOTICE: &str =
    "Interrupt requested. Waiting for current action to complete...";
pub const INTERRUPT_ACKNOWLEDGED: &str = "Interrupt acknowledged. Returning to prompt.";

/// Multi-step tool loop driver
pub struct ChatLoop {
    adapter: Adapter,
    model: String,
    options: ChatOptions,
    registry: ToolRegistry,
    tool_context: ToolContext,
    approvals: ApprovalGate,
    cancel: CancellationToken,
    renderer: Renderer,
    slomo: Duration,
}

impl ChatLoop {
    pub fn new(
        adapter: Adapter,
        model: impl Into<String>,
        registry: ToolRegistry,
        tool_context: ToolContext,
    ) -> Self {
        Self {
            adapter,
            model: model.into(),
            options: ChatOptions::default(),
            registry,
            tool_context,
            approvals: ApprovalGate::in_memory(),
            cancel: CancellationToken::new(),
            renderer: Renderer::plain(),
            slomo: Duration::ZERO,
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_approvals(mut self, approvals: ApprovalGate) -> Self {
        self.approvals = approvals;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn provider_name(&self) -> &str {
        self.adapter.provider_name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tool_context(&self) -> &ToolContext {
        &self.tool_context
    }

    pub fn tool_context_mut(&mut self) -> &mut ToolContext {
        &mut self.tool_context
    }

    pub fn approvals(&self) -> &ApprovalGate {
        &self.approvals
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn renderer(&self) -> Renderer {
        self.renderer
    }

    pub fn slomo(&self) -> Duration {
        self.slomo
    }

    /// Delay applied before every model call
    pub fn set_slomo(&mut self, delay: Duration) {
        self.slomo = delay;
    }

    /// Run one turn against `conversation`
    ///
    /// The conversation must already end with the user message that starts
    /// the turn. Failures are reported on `out` and in the outcome; they
    /// never unwind past this call.
    pub fn run_turn(
        &mut self,
        conversation: &mut Conversation,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> TurnOutcome {
        let mut state = TurnState::new();
        match self.drive(conversation, prompter, out, &mut state) {
            Ok(outcome) => state.finish(outcome),
            Err(e) => state.finish(TurnOutcome::Failed(format!("output error: {}", e))),
        }
    }

    fn drive(
        &mut self,
        conversation: &mut Conversation,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
        state: &mut TurnState,
    ) -> io::Result<TurnOutcome> {
        loop {
            if !self.slomo.is_zero() {
                thread::sleep(self.slomo);
            }
            if self.cancel.take_notice() {
                writeln!(out, "{}", INTERRUPT_PENDING_NOTICE)?;
            }

            state.enter(TurnPhase::Streaming);
            let reply = match self.stream_reply(conversation, out) {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::debug!(event = "model_error", error = %e);
                    writeln!(out, "\n[error] {}", e)?;
                    return Ok(TurnOutcome::Failed(e.to_string()));
                }
            };

            if reply.is_empty() {
                tracing::debug!(event = "model_empty");
                writeln!(out, "{}", EMPTY_RESPONSE_WARNING)?;
                return Ok(TurnOutcome::EmptyResponse);
            }

            let content = reply.stored_content();
            tracing::debug!(event = "message", role = "assistant", content = %content);
            conversation.push_assistant(content, reply.usage);

            if self.cancel.is_requested() && self.ask_interrupt(prompter, out)? == InterruptChoice::Abort {
                conversation.pop_last_assistant();
                return Ok(TurnOutcome::Aborted);
            }

            let calls = reply.tool_calls();
            if calls.is_empty() {
                return Ok(TurnOutcome::Completed);
            }
            tracing::debug!(event = "tool_calls", count = calls.len());

            for call in &calls {
                if self.cancel.is_requested()
                    && self.ask_interrupt(prompter, out)? == InterruptChoice::Abort
                {
                    return Ok(TurnOutcome::Aborted);
                }
                let result = self.handle_call(call, prompter, out, state)?;
                conversation.push_user(format_tool_result(&call.name, &result));
                state.enter(TurnPhase::ResultAppended);
            }
        }
    }

    /// Stream one response, echoing it to `out` as it arrives
    fn stream_reply(
        &self,
        conversation: &Conversation,
        out: &mut dyn Write,
    ) -> Result<Reply, AdapterError> {
        write!(out, "{} ", self.renderer.agent_label())?;
        out.flush()?;
        tracing::debug!(
            event = "model_request",
            provider = self.adapter.provider_name(),
            model = %self.model,
            messages = conversation.len(),
        );

        let stream = self
            .adapter
            .chat_stream(&self.model, conversation.messages(), &self.options)?;
        let mut reply = Reply::default();
        for item in stream {
            let event = item?;
            self.renderer.stream_event(out, &event)?;
            if !reply.absorb(event) {
                break;
            }
        }
        writeln!(out)?;

        if let Some(message) = reply.error.take() {
            return Err(AdapterError::Provider(message));
        }
        tracing::debug!(
            event = "model_response",
            reply = %reply.text,
            native_calls = reply.native_calls.len(),
            usage = ?reply.usage,
        );
        Ok(reply)
    }

    /// Run (or refuse) one call and return the text fed back to the model
    fn handle_call(
        &mut self,
        call: &ToolCall,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
        state: &mut TurnState,
    ) -> io::Result<String> {
        let args = call.arguments_json();
        writeln!(out, "\n[tool call] {} {}", call.name, args)?;
        tracing::debug!(event = "tool_call", name = %call.name, args = %args);

        if let Some(detail) = &call.malformed {
            state.stats.invalid_calls += 1;
            let result = format!("ERROR: invalid arguments: {}", detail);
            self.renderer.tool_result(out, &call.name, &result)?;
            return Ok(result);
        }

        state.enter(TurnPhase::Approval);
        match self.approvals.check(call, prompter) {
            ApprovalDecision::Denied { reason } => {
                state.stats.tools_denied += 1;
                writeln!(out, "[tool skipped] execution denied by user")?;
                tracing::debug!(event = "tool_denied", name = %call.name, reason = ?reason);
                Ok(denial_message(reason.as_deref()))
            }
            ApprovalDecision::Approved => {
                state.enter(TurnPhase::Executing);
                let result = self
                    .registry
                    .execute(&call.name, &call.arguments, &self.tool_context);
                state.stats.tools_executed += 1;
                self.renderer.tool_result(out, &call.name, &result)?;
                tracing::debug!(event = "tool_result", name = %call.name, result = %result);
                Ok(result)
            }
        }
    }

    /// Ask continue/abort and clear the pending interrupt
    fn ask_interrupt(
        &self,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> io::Result<InterruptChoice> {
        let choice = prompter.interrupt_choice();
        self.cancel.clear();
        tracing::debug!(event = "interrupt", choice = ?choice);
        if choice == InterruptChoice::Abort {
            writeln!(out, "{}", INTERRUPT_ACKNOWLEDGED)?;
        }
        Ok(choice)
    }
}
