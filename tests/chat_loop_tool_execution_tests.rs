//! Chat loop tool execution integration tests
//!
//! Drives `ChatLoop::run_turn` end to end with a FakeTransport backend,
//! a ScriptedPrompter standing in for the user and counting tools.
//!
//! Covers:
//! - the five-message tool round trip
//! - denial short-circuit (tool never executed)
//! - cancellation abort / continue at the safe points, including an
//!   interrupt raised while a tool runs
//! - "always" approvals surviving a new gate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clia::execution_engine::{Tool, ToolContext, ToolError, ToolRegistry};
use clia::llm::adapters::ollama::OllamaAdapter;
use clia::llm::adapters::transport::{FakeResponse, FakeTransport, Transport};
use clia::llm::adapters::Adapter;
use clia::llm::chat_loop::{ChatLoop, TurnOutcome};
use clia::llm::stream_events::ToolArgs;
use clia::llm::tool_call::format_tool_result;
use clia::llm::types::{Conversation, Message, Role};
use clia::ui::approval::{ApprovalGate, DENIAL_MESSAGE};
use clia::ui::cancel::CancellationToken;
use clia::ui::prompt::{ApprovalResponse, InterruptChoice, ScriptedPrompter};
use serde_json::json;
use tempfile::TempDir;

// === TEST UTILITIES ===

/// Stand-in for run_shell that records how often it ran
struct CountingShell {
    calls: Arc<AtomicUsize>,
}

impl Tool for CountingShell {
    fn name(&self) -> &str {
        "run_shell"
    }
    fn description(&self) -> &str {
        "Execute a shell command"
    }
    fn schema(&self) -> &str {
        r#"{"command": "ls"}"#
    }
    fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("exit code 0\nfile1 file2".to_string())
    }
}

/// Shell that raises an interrupt while it runs, like Ctrl-C mid-tool
struct InterruptingShell {
    calls: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl Tool for InterruptingShell {
    fn name(&self) -> &str {
        "run_shell"
    }
    fn description(&self) -> &str {
        "Execute a shell command"
    }
    fn schema(&self) -> &str {
        r#"{"command": "ls"}"#
    }
    fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cancel.request();
        Ok("exit code 0\nfile1 file2".to_string())
    }
}

/// NDJSON body streaming `text` in a few pieces
fn ndjson_reply(text: &str) -> String {
    let mut lines = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    for piece in chars.chunks(7) {
        let piece: String = piece.iter().collect();
        lines.push(json!({"message": {"role": "assistant", "content": piece}, "done": false}).to_string());
    }
    lines.push(
        json!({"message": {"role": "assistant", "content": ""}, "done": true,
               "prompt_eval_count": 10, "eval_count": 5})
        .to_string(),
    );
    lines.join("\n")
}

const TOOL_CALL_TEXT: &str = "<tool name=\"run_shell\">\n{\"command\": \"ls\"}\n</tool>";
const FINAL_TEXT: &str = "Here are your files.";

struct Harness {
    chat: ChatLoop,
    calls: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

fn harness(replies: &[&str], approvals: ApprovalGate) -> Harness {
    let responses = replies
        .iter()
        .map(|r| FakeResponse::Stream(ndjson_reply(r)))
        .collect();
    let adapter = Adapter::Ollama(OllamaAdapter::with_transport(
        "http://fake",
        Transport::Fake(FakeTransport::new(responses)),
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingShell {
            calls: Arc::clone(&calls),
        }))
        .unwrap();
    let cancel = CancellationToken::new();
    let chat = ChatLoop::new(adapter, "qwen3:14b", registry, ToolContext::new("."))
        .with_approvals(approvals)
        .with_cancellation(cancel.clone());
    Harness {
        chat,
        calls,
        cancel,
    }
}

/// Like `harness`, but the tool itself raises the interrupt
fn interrupting_harness(replies: &[&str]) -> Harness {
    let responses = replies
        .iter()
        .map(|r| FakeResponse::Stream(ndjson_reply(r)))
        .collect();
    let adapter = Adapter::Ollama(OllamaAdapter::with_transport(
        "http://fake",
        Transport::Fake(FakeTransport::new(responses)),
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(InterruptingShell {
            calls: Arc::clone(&calls),
            cancel: cancel.clone(),
        }))
        .unwrap();
    let chat = ChatLoop::new(adapter, "qwen3:14b", registry, ToolContext::new("."))
        .with_cancellation(cancel.clone());
    Harness {
        chat,
        calls,
        cancel,
    }
}

fn two_calls() -> String {
    format!("{}\n{}", TOOL_CALL_TEXT, TOOL_CALL_TEXT)
}

fn start() -> Conversation {
    let mut conversation = Conversation::new("You are a test agent.");
    conversation.push_user("list files");
    conversation
}

fn roles(conversation: &Conversation) -> Vec<Role> {
    conversation.messages().iter().map(|m| m.role).collect()
}

// === END-TO-END ===

#[test]
fn test_end_to_end_five_messages() {
    let mut h = harness(&[TOOL_CALL_TEXT, FINAL_TEXT], ApprovalGate::in_memory());
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_approvals([ApprovalResponse::ApproveOnce]);
    let mut out = Vec::new();

    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(prompter.approval_requests, vec!["run_shell"]);

    let messages = conversation.messages();
    assert_eq!(messages.len(), 5);
    assert_eq!(
        roles(&conversation),
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(messages[1].content, "list files");
    assert_eq!(messages[2].content, TOOL_CALL_TEXT);
    assert_eq!(
        messages[3].content,
        format_tool_result("run_shell", "exit code 0\nfile1 file2")
    );
    assert_eq!(messages[4].content, FINAL_TEXT);

    // usage recorded on both assistant messages
    assert_eq!(conversation.usage_totals().total, 30);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[tool call] run_shell {\"command\":\"ls\"}"));
    assert!(text.contains("[tool result]"));
    assert!(text.contains(FINAL_TEXT));
}

// === DENIAL ===

#[test]
fn test_denial_never_executes_tool() {
    let mut h = harness(&[TOOL_CALL_TEXT, "Okay, I won't."], ApprovalGate::in_memory());
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new()
        .with_approvals([ApprovalResponse::Deny])
        .with_reasons([Some("not now".to_string())]);
    let mut out = Vec::new();

    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);

    let denial_results: Vec<&Message> = conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::User && m.content.contains("<tool_result"))
        .collect();
    assert_eq!(denial_results.len(), 1);
    assert_eq!(
        denial_results[0].content,
        format_tool_result("run_shell", &format!("{} Reason: not now", DENIAL_MESSAGE))
    );
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("[tool skipped] execution denied by user"));
}

#[test]
fn test_denial_without_reason() {
    let mut h = harness(&[TOOL_CALL_TEXT, "Fine."], ApprovalGate::in_memory());
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_approvals([ApprovalResponse::Deny]);
    let mut out = Vec::new();

    h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(
        conversation.messages()[3].content,
        format_tool_result("run_shell", DENIAL_MESSAGE)
    );
}

// === CANCELLATION ===

#[test]
fn test_cancellation_abort_removes_last_assistant() {
    let mut h = harness(&[TOOL_CALL_TEXT], ApprovalGate::in_memory());
    let mut conversation = start();
    let before: Vec<Message> = conversation.messages().to_vec();
    let mut prompter = ScriptedPrompter::new().with_interrupts([InterruptChoice::Abort]);
    let mut out = Vec::new();

    assert!(h.cancel.request());
    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Aborted);
    assert_eq!(conversation.messages(), before.as_slice());
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert!(prompter.approval_requests.is_empty());
    assert_eq!(prompter.interrupt_requests, 1);
    assert!(!h.cancel.is_requested());
    assert_eq!(conversation.usage_totals().total, 0);
}

#[test]
fn test_cancellation_continue_resumes() {
    let mut h = harness(&[TOOL_CALL_TEXT, FINAL_TEXT], ApprovalGate::in_memory());
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new()
        .with_interrupts([InterruptChoice::Continue])
        .with_approvals([ApprovalResponse::ApproveOnce]);
    let mut out = Vec::new();

    h.cancel.request();
    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(prompter.interrupt_requests, 1);
    assert_eq!(conversation.len(), 5);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert!(!h.cancel.is_requested());
}

#[test]
fn test_interrupt_during_tool_abort_skips_remaining_calls() {
    let reply = two_calls();
    let mut h = interrupting_harness(&[&reply]);
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new()
        .with_approvals([ApprovalResponse::ApproveOnce, ApprovalResponse::ApproveOnce])
        .with_interrupts([InterruptChoice::Abort]);
    let mut out = Vec::new();

    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Aborted);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(prompter.approval_requests, vec!["run_shell"]);
    assert_eq!(prompter.interrupt_requests, 1);
    // the assistant turn and the finished call's result stay
    assert_eq!(
        roles(&conversation),
        vec![Role::System, Role::User, Role::Assistant, Role::User]
    );
    assert_eq!(conversation.messages()[2].content, reply);
    assert_eq!(
        conversation.messages()[3].content,
        format_tool_result("run_shell", "exit code 0\nfile1 file2")
    );
    assert!(!h.cancel.is_requested());
}

#[test]
fn test_interrupt_during_tool_continue_runs_remaining_calls() {
    let reply = two_calls();
    let mut h = interrupting_harness(&[&reply, FINAL_TEXT]);
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new()
        .with_approvals([ApprovalResponse::ApproveOnce, ApprovalResponse::ApproveOnce])
        .with_interrupts([InterruptChoice::Continue, InterruptChoice::Continue]);
    let mut out = Vec::new();

    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    assert_eq!(prompter.approval_requests.len(), 2);
    // once before the second call, once after the final reply
    assert_eq!(prompter.interrupt_requests, 2);
    assert_eq!(
        roles(&conversation),
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::User,
            Role::Assistant
        ]
    );
    assert_eq!(conversation.messages()[5].content, FINAL_TEXT);
    assert!(!h.cancel.is_requested());
}

#[test]
fn test_pending_interrupt_notice_printed_once() {
    let mut h = harness(&["Just text."], ApprovalGate::in_memory());
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_interrupts([InterruptChoice::Continue]);
    let mut out = Vec::new();

    h.cancel.request();
    h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text.matches("Interrupt requested. Waiting for current action to complete...")
            .count(),
        1
    );
    assert_eq!(conversation.len(), 3);
}

// === APPROVAL DURABILITY ===

#[test]
fn test_always_approval_survives_new_gate() {
    let dir = TempDir::new().unwrap();

    let gate = ApprovalGate::load(dir.path()).unwrap();
    let mut h = harness(&[TOOL_CALL_TEXT, FINAL_TEXT], gate);
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_approvals([ApprovalResponse::ApproveAlways]);
    let mut out = Vec::new();
    h.chat.run_turn(&mut conversation, &mut prompter, &mut out);
    assert_eq!(prompter.approval_requests.len(), 1);

    // a fresh process: new gate from the same directory, no prompt needed
    let gate = ApprovalGate::load(dir.path()).unwrap();
    assert!(gate.is_approved("run_shell"));
    let mut h = harness(&[TOOL_CALL_TEXT, FINAL_TEXT], gate);
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new();
    let mut out = Vec::new();
    let outcome = h.chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert!(prompter.approval_requests.is_empty());
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

// === FAILURES ===

#[test]
fn test_transport_failure_keeps_conversation() {
    let adapter = Adapter::Ollama(OllamaAdapter::with_transport(
        "http://fake",
        Transport::Fake(FakeTransport::new(vec![
            FakeResponse::Stream(ndjson_reply(TOOL_CALL_TEXT)),
            FakeResponse::NetworkError("connection reset".to_string()),
        ])),
    ));
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingShell {
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .unwrap();
    let mut chat = ChatLoop::new(adapter, "m", registry, ToolContext::new("."));
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_approvals([ApprovalResponse::ApproveOnce]);
    let mut out = Vec::new();

    let outcome = chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(
        outcome,
        TurnOutcome::Failed("Network error: connection reset".to_string())
    );
    // system, user, assistant(tool call), tool result
    assert_eq!(conversation.len(), 4);
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("[error] Network error: connection reset"));
}

#[test]
fn test_native_tool_call_stored_as_markup() {
    let native = [
        json!({"message": {"role": "assistant", "content": "",
               "tool_calls": [{"function": {"name": "run_shell", "arguments": {"command": "ls"}}}]},
               "done": false})
        .to_string(),
        json!({"message": {"role": "assistant", "content": ""}, "done": true}).to_string(),
    ]
    .join("\n");
    let adapter = Adapter::Ollama(OllamaAdapter::with_transport(
        "http://fake",
        Transport::Fake(FakeTransport::new(vec![
            FakeResponse::Stream(native),
            FakeResponse::Stream(ndjson_reply(FINAL_TEXT)),
        ])),
    ));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(CountingShell {
            calls: Arc::clone(&calls),
        }))
        .unwrap();
    let mut chat = ChatLoop::new(adapter, "m", registry, ToolContext::new("."));
    let mut conversation = start();
    let mut prompter = ScriptedPrompter::new().with_approvals([ApprovalResponse::ApproveOnce]);
    let mut out = Vec::new();

    let outcome = chat.run_turn(&mut conversation, &mut prompter, &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(conversation.len(), 5);
    assert_eq!(
        conversation.messages()[2].content,
        "<tool name=\"run_shell\">\n{\"command\":\"ls\"}\n</tool>"
    );
}
