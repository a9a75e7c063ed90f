//! run_shell: execute a shell command in the workspace
//!
//! Output format:
//!
//! ```text
//! exit code 0
//! <stdout>
//! [stderr]
//! <stderr>
//! ```

use std::process::Command;

use crate::execution_engine::{required_str, Tool, ToolContext, ToolError};
use crate::llm::stream_events::ToolArgs;
use crate::os_tools::process::{run_with_timeout, ProcessOutput};

/// Shell command tool (`bash -c`)
#[derive(Debug, Clone)]
pub struct RunShellTool {
    description: String,
    /// Mirror command output to the terminal while it runs
    echo: bool,
}

impl RunShellTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            description: format!(
                "Execute a shell command inside the current workspace (timeout {}s). \
                 Commands are run in a Linux environment and must not be interactive.",
                timeout_secs
            ),
            echo: false,
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

/// Render captured process output for the model
pub fn format_shell_output(output: &ProcessOutput) -> String {
    let stdout = output.stdout.trim();
    let stderr = output.stderr.trim();

    let mut combined = stdout.to_string();
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str("[stderr]\n");
        combined.push_str(stderr);
    }

    let status = format!("exit code {}", output.exit_code());
    if combined.is_empty() {
        status
    } else {
        format!("{}\n{}", status, combined)
    }
}

impl Tool for RunShellTool {
    fn name(&self) -> &str {
        "run_shell"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &str {
        r#"{"command": "<shell command string>"}"#
    }

    fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let command = required_str(args, "command")?;

        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(command);
        if ctx.workspace_root.is_dir() {
            cmd.current_dir(&ctx.workspace_root);
        }

        let output = run_with_timeout(cmd, None, ctx.shell_timeout, self.echo)?;
        Ok(format_shell_output(&output))
    }
}
