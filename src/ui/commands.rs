//! Slash-command parsing
//!
//! INPUT ROUTING:
//! - Input starting with "/" is a command and never reaches the model
//! - Bare `exit` / `quit` leave the REPL
//! - Everything else is chat
//!
//! Parsing is pure; the REPL executes the resulting [`Command`].

use std::time::Duration;

/// Prefix that marks a command
pub const COMMAND_PREFIX: char = '/';

/// Default message count for `/tail`
pub const DEFAULT_TAIL_COUNT: usize = 5;

/// Reply for an unrecognized command
pub const UNKNOWN_COMMAND: &str = "Unknown command - see /help";

/// Parsed user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank line
    None,
    Help,
    Exit,
    Info,
    ListSessions,
    Load(String),
    Remove(String),
    Save(String),
    Tail(usize),
    /// `/debug` shows the state, `/debug on|off` sets it
    Debug(Option<bool>),
    DebugTool { name: String, args: String },
    Truncate(bool),
    /// `/slomo` shows the delay, `/slomo N` sets it in seconds
    Slomo(Option<f64>),
    Unsafe(Option<bool>),
    ContextDump(Option<String>),
    /// Known command with bad arguments; carries the usage line
    Usage(&'static str),
    Unknown,
    /// Conversational text for the model
    Chat(String),
}

/// Help table entry
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

/// All commands, sorted by name
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "context_dump",
        usage: "/context_dump [path]",
        description: "Export the current conversation context to stdout or a file",
    },
    CommandInfo {
        name: "debug",
        usage: "/debug [on|off]",
        description: "Toggle or display debug logging",
    },
    CommandInfo {
        name: "debug_tool",
        usage: "/debug_tool <tool_name> <json_args>",
        description: "Run a tool manually with JSON arguments",
    },
    CommandInfo {
        name: "exit",
        usage: "/exit",
        description: "Exit the program",
    },
    CommandInfo {
        name: "help",
        usage: "/help",
        description: "Show available commands",
    },
    CommandInfo {
        name: "info",
        usage: "/info",
        description: "Display model and session statistics",
    },
    CommandInfo {
        name: "load",
        usage: "/load <name>",
        description: "Load a saved session",
    },
    CommandInfo {
        name: "ls",
        usage: "/ls",
        description: "List saved sessions",
    },
    CommandInfo {
        name: "rm",
        usage: "/rm <name>",
        description: "Delete a saved session",
    },
    CommandInfo {
        name: "save",
        usage: "/save <name>",
        description: "Save the current session",
    },
    CommandInfo {
        name: "slomo",
        usage: "/slomo [seconds]",
        description: "Set or display delay between model calls",
    },
    CommandInfo {
        name: "tail",
        usage: "/tail [N]",
        description: "Show the last N conversation messages",
    },
    CommandInfo {
        name: "truncate",
        usage: "/truncate on|off",
        description: "Enable or disable tool output truncation",
    },
    CommandInfo {
        name: "unsafe",
        usage: "/unsafe [on|off]",
        description: "Enable or disable workspace safety checks",
    },
];

/// Usage line of a known command (empty for unknown names)
pub fn usage_of(name: &str) -> &'static str {
    COMMANDS
        .iter()
        .find(|info| info.name == name)
        .map(|info| info.usage)
        .unwrap_or("")
}

/// Render the `/help` listing
pub fn render_help() -> String {
    let mut out = String::from("Available commands:");
    for info in COMMANDS {
        out.push_str(&format!("\n  {:<12} {}", info.usage, info.description));
    }
    out
}

/// Parse one line of user input
///
/// # Examples
/// ```
/// use clia::ui::commands::{parse_command, Command};
///
/// assert_eq!(parse_command("/help"), Command::Help);
/// assert_eq!(parse_command("quit"), Command::Exit);
/// assert_eq!(parse_command("/tail 3"), Command::Tail(3));
/// assert!(matches!(parse_command("list files"), Command::Chat(_)));
/// ```
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::None;
    }

    let Some(rest) = trimmed.strip_prefix(COMMAND_PREFIX) else {
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
            return Command::Exit;
        }
        return Command::Chat(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_lowercase();
    let argument = parts.next().unwrap_or("").trim();

    match name.as_str() {
        "help" => Command::Help,
        "exit" => Command::Exit,
        "info" => Command::Info,
        "ls" => Command::ListSessions,
        "load" => required(argument, "load", Command::Load),
        "rm" => required(argument, "rm", Command::Remove),
        "save" => required(argument, "save", Command::Save),
        "tail" => parse_tail(argument),
        "debug" => match parse_switch(argument, false) {
            Ok(state) => Command::Debug(state),
            Err(()) => Command::Usage(usage_of("debug")),
        },
        "debug_tool" => parse_debug_tool(argument),
        "truncate" => match parse_switch(argument, false) {
            Ok(Some(enabled)) => Command::Truncate(enabled),
            _ => Command::Usage(usage_of("truncate")),
        },
        "slomo" => parse_slomo(argument),
        "unsafe" => match parse_switch(argument, true) {
            Ok(state) => Command::Unsafe(state),
            Err(()) => Command::Usage(usage_of("unsafe")),
        },
        "context_dump" => {
            Command::ContextDump((!argument.is_empty()).then(|| argument.to_string()))
        }
        _ => Command::Unknown,
    }
}

fn required(argument: &str, name: &str, build: fn(String) -> Command) -> Command {
    if argument.is_empty() {
        Command::Usage(usage_of(name))
    } else {
        build(argument.to_string())
    }
}

/// `on`/`off`; `lenient` also accepts `true`/`false`/`1`/`0`
fn parse_switch(argument: &str, lenient: bool) -> Result<Option<bool>, ()> {
    match argument.to_lowercase().as_str() {
        "" => Ok(None),
        "on" => Ok(Some(true)),
        "off" => Ok(Some(false)),
        "true" | "1" if lenient => Ok(Some(true)),
        "false" | "0" if lenient => Ok(Some(false)),
        _ => Err(()),
    }
}

fn parse_tail(argument: &str) -> Command {
    if argument.is_empty() {
        return Command::Tail(DEFAULT_TAIL_COUNT);
    }
    match argument.parse::<i64>() {
        Ok(count) => Command::Tail(count.max(1) as usize),
        Err(_) => Command::Usage(usage_of("tail")),
    }
}

fn parse_slomo(argument: &str) -> Command {
    if argument.is_empty() {
        return Command::Slomo(None);
    }
    match argument.parse::<f64>() {
        // Delays a Duration cannot hold are rejected here, not at sleep time
        Ok(seconds) if Duration::try_from_secs_f64(seconds).is_ok() => {
            Command::Slomo(Some(seconds))
        }
        _ => Command::Usage(usage_of("slomo")),
    }
}

fn parse_debug_tool(argument: &str) -> Command {
    if argument.is_empty() {
        return Command::Usage(usage_of("debug_tool"));
    }
    let mut parts = argument.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_string();
    let args = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("{}")
        .to_string();
    Command::DebugTool { name, args }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_chat() {
        assert_eq!(parse_command("   "), Command::None);
        assert_eq!(
            parse_command("  list files "),
            Command::Chat("  list files ".to_string())
        );
    }

    #[test]
    fn test_bare_exit_words() {
        assert_eq!(parse_command("exit"), Command::Exit);
        assert_eq!(parse_command("QUIT"), Command::Exit);
        assert!(matches!(parse_command("exit now"), Command::Chat(_)));
    }

    #[test]
    fn test_command_name_case_insensitive() {
        assert_eq!(parse_command("/HELP"), Command::Help);
        assert_eq!(parse_command("/Info"), Command::Info);
    }

    #[test]
    fn test_unknown_and_bare_prefix() {
        assert_eq!(parse_command("/"), Command::Unknown);
        assert_eq!(parse_command("/plan"), Command::Unknown);
    }

    #[test]
    fn test_required_arguments() {
        assert_eq!(parse_command("/save demo"), Command::Save("demo".to_string()));
        assert_eq!(parse_command("/save"), Command::Usage("/save <name>"));
        assert_eq!(parse_command("/load  a b "), Command::Load("a b".to_string()));
        assert_eq!(parse_command("/rm"), Command::Usage("/rm <name>"));
    }

    #[test]
    fn test_tail() {
        assert_eq!(parse_command("/tail"), Command::Tail(5));
        assert_eq!(parse_command("/tail 2"), Command::Tail(2));
        assert_eq!(parse_command("/tail 0"), Command::Tail(1));
        assert_eq!(parse_command("/tail x"), Command::Usage("/tail [N]"));
    }

    #[test]
    fn test_switches() {
        assert_eq!(parse_command("/debug"), Command::Debug(None));
        assert_eq!(parse_command("/debug ON"), Command::Debug(Some(true)));
        assert_eq!(parse_command("/debug 1"), Command::Usage("/debug [on|off]"));
        assert_eq!(parse_command("/truncate off"), Command::Truncate(false));
        assert_eq!(parse_command("/truncate"), Command::Usage("/truncate on|off"));
        assert_eq!(parse_command("/unsafe 1"), Command::Unsafe(Some(true)));
        assert_eq!(parse_command("/unsafe"), Command::Unsafe(None));
    }

    #[test]
    fn test_slomo() {
        assert_eq!(parse_command("/slomo"), Command::Slomo(None));
        assert_eq!(parse_command("/slomo 1.5"), Command::Slomo(Some(1.5)));
        assert_eq!(parse_command("/slomo -1"), Command::Usage("/slomo [seconds]"));
        assert_eq!(parse_command("/slomo 1e20"), Command::Usage("/slomo [seconds]"));
        assert_eq!(parse_command("/slomo inf"), Command::Usage("/slomo [seconds]"));
        assert_eq!(parse_command("/slomo NaN"), Command::Usage("/slomo [seconds]"));
    }

    #[test]
    fn test_debug_tool() {
        assert_eq!(
            parse_command(r#"/debug_tool bc {"expression": "2+2"}"#),
            Command::DebugTool {
                name: "bc".to_string(),
                args: r#"{"expression": "2+2"}"#.to_string()
            }
        );
        assert_eq!(
            parse_command("/debug_tool run_shell"),
            Command::DebugTool {
                name: "run_shell".to_string(),
                args: "{}".to_string()
            }
        );
    }

    #[test]
    fn test_context_dump() {
        assert_eq!(parse_command("/context_dump"), Command::ContextDump(None));
        assert_eq!(
            parse_command("/context_dump out/ctx.json"),
            Command::ContextDump(Some("out/ctx.json".to_string()))
        );
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = render_help();
        assert!(help.starts_with("Available commands:"));
        for info in COMMANDS {
            assert!(help.contains(info.usage));
        }
    }
}
