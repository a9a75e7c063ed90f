//! Conversation types: Role, Message, UsageCounts, Conversation
//!
//! These types double as the wire schema sent to backends and the
//! on-disk session format. Index 0 of a conversation is always the
//! system message.

use serde::{Deserialize, Serialize};

/// Message role (universal subset across providers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (sets behavior/context)
    System,
    /// User message (human input and tool results)
    User,
    /// Assistant message (model response)
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when a conversation is flattened into a single prompt
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// Token usage reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    #[serde(rename = "prompt_tokens", default)]
    pub prompt: u64,
    #[serde(rename = "completion_tokens", default)]
    pub completion: u64,
    #[serde(rename = "total_tokens", default)]
    pub total: u64,
}

impl UsageCounts {
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt,
            completion,
            total: prompt.saturating_add(completion),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prompt == 0 && self.completion == 0 && self.total == 0
    }

    /// Add another usage record into this one, saturating at `u64::MAX`
    pub fn accumulate(&mut self, other: &UsageCounts) {
        self.prompt = self.prompt.saturating_add(other.prompt);
        self.completion = self.completion.saturating_add(other.completion);
        self.total = self.total.saturating_add(other.total);
    }
}

/// Single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageCounts>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            usage: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            usage: None,
        }
    }

    pub fn assistant(content: impl Into<String>, usage: Option<UsageCounts>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            usage,
        }
    }
}

/// Ordered, append-only message history
///
/// Mutation is limited to:
/// - appending messages
/// - refreshing the system message content in place
/// - removing the most recent message when it is an assistant message
///   (cancellation abort)
///
/// Usage totals are tracked alongside and recomputed from scratch whenever
/// a whole message list is adopted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
    usage_totals: UsageCounts,
}

impl Conversation {
    /// Create a conversation holding only the system message
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            usage_totals: UsageCounts::default(),
        }
    }

    /// Adopt a persisted message list
    ///
    /// The system message is never trusted from disk: element 0 is
    /// overwritten with `system_prompt` when it is a system message,
    /// otherwise a fresh system message is inserted in front.
    pub fn from_messages(mut messages: Vec<Message>, system_prompt: &str) -> Self {
        match messages.first_mut() {
            Some(first) if first.role == Role::System => {
                first.content = system_prompt.to_string();
            }
            _ => messages.insert(0, Message::system(system_prompt)),
        }
        let mut conversation = Self {
            messages,
            usage_totals: UsageCounts::default(),
        };
        conversation.recalculate_usage();
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn usage_totals(&self) -> UsageCounts {
        self.usage_totals
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message, folding its usage into the totals
    pub fn push_assistant(&mut self, content: impl Into<String>, usage: Option<UsageCounts>) {
        if let Some(ref usage) = usage {
            self.usage_totals.accumulate(usage);
        }
        self.messages.push(Message::assistant(content, usage));
    }

    /// Remove the most recent message if it is an assistant message
    ///
    /// Its usage is subtracted again by recomputing the totals.
    pub fn pop_last_assistant(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(last) if last.role == Role::Assistant => {
                let removed = self.messages.pop();
                self.recalculate_usage();
                removed
            }
            _ => None,
        }
    }

    /// Overwrite the system message content (index 0)
    pub fn refresh_system_prompt(&mut self, system_prompt: &str) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => {
                first.content = system_prompt.to_string();
            }
            _ => self.messages.insert(0, Message::system(system_prompt)),
        }
    }

    /// Rough token estimate from whitespace-separated words
    pub fn estimate_tokens(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.content.split_whitespace().count())
            .sum()
    }

    fn recalculate_usage(&mut self) {
        let mut totals = UsageCounts::default();
        for usage in self.messages.iter().filter_map(|m| m.usage.as_ref()) {
            totals.accumulate(usage);
        }
        self.usage_totals = totals;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let msg = Message::assistant("hi", Some(UsageCounts::new(3, 4)));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["usage"]["prompt_tokens"], 3);
        assert_eq!(json["usage"]["completion_tokens"], 4);
        assert_eq!(json["usage"]["total_tokens"], 7);

        let user = serde_json::to_value(Message::user("x")).unwrap();
        assert!(user.get("usage").is_none());
    }

    #[test]
    fn test_from_messages_overwrites_system() {
        let messages = vec![Message::system("old prompt"), Message::user("hello")];
        let conv = Conversation::from_messages(messages, "live prompt");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].content, "live prompt");
    }

    #[test]
    fn test_from_messages_inserts_missing_system() {
        let messages = vec![Message::user("hello")];
        let conv = Conversation::from_messages(messages, "live prompt");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.messages()[1].content, "hello");
    }

    #[test]
    fn test_usage_recomputed_not_double_counted() {
        let mut conv = Conversation::new("sys");
        conv.push_user("a");
        conv.push_assistant("b", Some(UsageCounts::new(10, 5)));
        conv.push_user("c");
        conv.push_assistant("d", Some(UsageCounts::new(20, 1)));
        assert_eq!(conv.usage_totals().total, 36);

        let reloaded = Conversation::from_messages(conv.messages().to_vec(), "sys");
        assert_eq!(reloaded.usage_totals(), UsageCounts::new(30, 6));
    }

    #[test]
    fn test_usage_saturates_on_hostile_counts() {
        let huge = UsageCounts::new(u64::MAX, 7);
        assert_eq!(huge.total, u64::MAX);

        let mut conv = Conversation::new("sys");
        conv.push_user("a");
        conv.push_assistant("b", Some(huge));
        conv.push_user("c");
        conv.push_assistant("d", Some(UsageCounts::new(u64::MAX, u64::MAX)));
        let totals = conv.usage_totals();
        assert_eq!(totals.prompt, u64::MAX);
        assert_eq!(totals.completion, u64::MAX);
        assert_eq!(totals.total, u64::MAX);
    }

    #[test]
    fn test_pop_last_assistant_only_pops_assistant() {
        let mut conv = Conversation::new("sys");
        conv.push_user("a");
        assert!(conv.pop_last_assistant().is_none());
        assert_eq!(conv.len(), 2);

        conv.push_assistant("b", Some(UsageCounts::new(1, 1)));
        let popped = conv.pop_last_assistant().unwrap();
        assert_eq!(popped.content, "b");
        assert_eq!(conv.len(), 2);
        assert!(conv.usage_totals().is_empty());
    }
}
