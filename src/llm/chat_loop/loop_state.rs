//! Turn state
//!
//! # TurnPhase
//!
//! `AwaitInput → Streaming → Approval → Executing → ResultAppended →
//! Streaming ...` until a response carries no tool calls.
//!
//! # TurnOutcome
//!
//! How a turn ended, plus counters for logging.

use std::fmt;

/// Where the chat loop currently is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitInput,
    Streaming,
    Approval,
    Executing,
    ResultAppended,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::AwaitInput => "await_input",
            TurnPhase::Streaming => "streaming",
            TurnPhase::Approval => "approval",
            TurnPhase::Executing => "executing",
            TurnPhase::ResultAppended => "result_appended",
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without tool calls
    Completed,
    /// The model produced neither text nor tool calls; nothing appended
    EmptyResponse,
    /// Transport or backend error; the conversation keeps what was appended
    Failed(String),
    /// The user chose abort at an interrupt prompt
    Aborted,
}

/// Per-turn bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnStats {
    pub model_calls: usize,
    pub tools_executed: usize,
    pub tools_denied: usize,
    pub invalid_calls: usize,
}

/// Phase tracker for one turn
#[derive(Debug, Clone)]
pub struct TurnState {
    phase: TurnPhase,
    pub stats: TurnStats,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            phase: TurnPhase::AwaitInput,
            stats: TurnStats::default(),
        }
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Move to `next`, recording the transition
    pub fn enter(&mut self, next: TurnPhase) {
        if next == TurnPhase::Streaming {
            self.stats.model_calls += 1;
        }
        tracing::trace!(event = "turn_phase", from = %self.phase, to = %next);
        self.phase = next;
    }

    /// Close the turn with `outcome`
    pub fn finish(&mut self, outcome: TurnOutcome) -> TurnOutcome {
        tracing::debug!(
            event = "turn_finished",
            outcome = ?outcome,
            model_calls = self.stats.model_calls,
            tools_executed = self.stats.tools_executed,
            tools_denied = self.stats.tools_denied,
            invalid_calls = self.stats.invalid_calls,
        );
        self.phase = TurnPhase::AwaitInput;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_counts_model_calls() {
        let mut state = TurnState::new();
        assert_eq!(state.phase(), TurnPhase::AwaitInput);
        state.enter(TurnPhase::Streaming);
        state.enter(TurnPhase::Approval);
        state.enter(TurnPhase::Executing);
        state.enter(TurnPhase::ResultAppended);
        state.enter(TurnPhase::Streaming);
        assert_eq!(state.stats.model_calls, 2);
        assert_eq!(state.phase(), TurnPhase::Streaming);
    }

    #[test]
    fn test_finish_returns_to_input() {
        let mut state = TurnState::new();
        state.enter(TurnPhase::Streaming);
        assert_eq!(state.finish(TurnOutcome::Completed), TurnOutcome::Completed);
        assert_eq!(state.phase(), TurnPhase::AwaitInput);
    }
}
