//! Tool trait and registry
//!
//! Tools are registered by unique name. The registry is the error
//! boundary: whatever a tool does, the caller gets a string back.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::execution_engine::errors::{RegistryError, ToolError};
use crate::execution_engine::tool_context::ToolContext;
use crate::llm::stream_events::ToolArgs;

/// A named capability the model can invoke
pub trait Tool: Send + Sync {
    /// Unique name used in tool-call markup
    fn name(&self) -> &str;

    /// Human text for the system prompt
    fn description(&self) -> &str;

    /// Example argument object, shown to the model
    fn schema(&self) -> &str;

    fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Fetch a required string argument
pub fn required_str<'a>(args: &'a ToolArgs, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(JsonValue::String(_)) | None => Err(ToolError::InvalidArguments(format!(
            "missing required argument '{}'",
            key
        ))),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument '{}' must be a string",
            key
        ))),
    }
}

/// Fetch an optional non-negative integer argument
///
/// Numeric strings are accepted; models often quote numbers.
pub fn optional_u64(args: &ToolArgs, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            ToolError::InvalidArguments(format!("argument '{}' must be a non-negative integer", key))
        }),
        Some(JsonValue::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            ToolError::InvalidArguments(format!("argument '{}' must be a non-negative integer", key))
        }),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "argument '{}' must be a non-negative integer",
            key
        ))),
    }
}

/// Registered tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; names must be unique
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&idx| self.tools[idx].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool list for the system prompt
    ///
    /// ```text
    /// - run_shell: Execute a shell command
    ///   args schema: {"command": "ls -la"}
    /// ```
    pub fn describe_for_prompt(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}\n  args schema: {}", t.name(), t.description(), t.schema()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run a tool and return its (possibly truncated) output
    ///
    /// Never fails: unknown tools and tool errors come back as strings
    /// starting with `ERROR`.
    pub fn execute(&self, name: &str, args: &ToolArgs, ctx: &ToolContext) -> String {
        let Some(tool) = self.get(name) else {
            return format!("ERROR: unknown tool '{}'", name);
        };
        let output = match tool.execute(args, ctx) {
            Ok(output) => output,
            Err(err) if err.is_usage_error() => format!("ERROR: {}", err),
            Err(err) => format!("ERROR while running '{}': {}", name, err),
        };
        ctx.truncate(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the text argument"
        }
        fn schema(&self) -> &str {
            r#"{"text": "hello"}"#
        }
        fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
            Ok(required_str(args, "text")?.to_string())
        }
    }

    struct Broken;

    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn schema(&self) -> &str {
            "{}"
        }
        fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
            Err(ToolError::Failed("disk on fire".to_string()))
        }
    }

    fn args(value: JsonValue) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo)).unwrap();
        registry.register(Box::new(Broken)).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry.register(Box::new(Echo)).unwrap_err();
        assert_eq!(err.to_string(), "Tool 'echo' already registered");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_execute_ok_and_errors() {
        let registry = registry();
        let ctx = ToolContext::new("/tmp");
        assert_eq!(registry.execute("echo", &args(json!({"text": "hi"})), &ctx), "hi");
        assert_eq!(
            registry.execute("echo", &args(json!({})), &ctx),
            "ERROR: missing required argument 'text'"
        );
        assert_eq!(
            registry.execute("broken", &args(json!({})), &ctx),
            "ERROR while running 'broken': disk on fire"
        );
        assert_eq!(
            registry.execute("nope", &args(json!({})), &ctx),
            "ERROR: unknown tool 'nope'"
        );
    }

    #[test]
    fn test_execute_truncates() {
        let registry = registry();
        let mut ctx = ToolContext::new("/tmp");
        ctx.truncate_limit = 2;
        assert_eq!(
            registry.execute("echo", &args(json!({"text": "hello"})), &ctx),
            "he\n...[truncated 3 characters]"
        );
    }

    #[test]
    fn test_describe_for_prompt() {
        let text = registry().describe_for_prompt();
        assert_eq!(
            text,
            "- echo: Echo the text argument\n  args schema: {\"text\": \"hello\"}\n- broken: Always fails\n  args schema: {}"
        );
    }

    #[test]
    fn test_optional_u64() {
        let a = args(json!({"n": 3, "s": "7", "bad": -1, "txt": "x"}));
        assert_eq!(optional_u64(&a, "n").unwrap(), Some(3));
        assert_eq!(optional_u64(&a, "s").unwrap(), Some(7));
        assert_eq!(optional_u64(&a, "missing").unwrap(), None);
        assert!(optional_u64(&a, "bad").is_err());
        assert!(optional_u64(&a, "txt").is_err());
    }
}
