//! CLI argument parsing
//!
//! Every flag is optional and overrides the matching config file value.
//!
//! ```text
//! clia [options] [prompt words...]
//! ```

use std::path::PathBuf;

use clap::Parser;

/// Parsed CLI arguments
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(name = "clia")]
#[command(about = "Interactive command-line agent with tool calling")]
#[command(version)]
pub struct Args {
    /// Initial message sent before the interactive loop starts
    pub prompt: Vec<String>,

    /// Backend provider: ollama, openai or mistral
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Backend base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key (literal or env:NAME)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Config file (default: <config dir>/clia/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// HTTP connect and per-read timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// run_shell timeout in seconds
    #[arg(long)]
    pub shell_timeout: Option<u64>,

    /// Directory for saved sessions
    #[arg(long)]
    pub session_dir: Option<PathBuf>,

    /// Debug log file
    #[arg(long)]
    pub debug_log: Option<PathBuf>,

    /// System prompt template file
    #[arg(long)]
    pub system_prompt: Option<PathBuf>,

    /// Allow file edits outside the working directory
    #[arg(long = "unsafe")]
    pub unsafe_paths: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Positional words joined into one message, if any
    pub fn initial_prompt(&self) -> Option<String> {
        let joined = self.prompt.join(" ");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("clia").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_args() {
        let args = parse(&[]);
        assert_eq!(args, Args::default());
        assert_eq!(args.initial_prompt(), None);
    }

    #[test]
    fn test_prompt_words_joined() {
        let args = parse(&["list", "files", "here"]);
        assert_eq!(args.initial_prompt().as_deref(), Some("list files here"));
    }

    #[test]
    fn test_flags() {
        let args = parse(&[
            "--provider",
            "openai",
            "--model",
            "gpt-4o",
            "--temperature",
            "0.2",
            "--shell-timeout",
            "5",
            "--unsafe",
            "--no-color",
        ]);
        assert_eq!(args.provider.as_deref(), Some("openai"));
        assert_eq!(args.model.as_deref(), Some("gpt-4o"));
        assert_eq!(args.temperature, Some(0.2));
        assert_eq!(args.shell_timeout, Some(5));
        assert!(args.unsafe_paths);
        assert!(args.no_color);
    }

    #[test]
    fn test_bad_number_rejected() {
        let result = Args::try_parse_from(["clia", "--timeout", "soon"]);
        assert!(result.is_err());
    }
}
