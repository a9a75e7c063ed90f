//! bc: evaluate math expressions with the system calculator

use std::process::Command;
use std::time::Duration;

use crate::execution_engine::{required_str, Tool, ToolContext, ToolError};
use crate::llm::stream_events::ToolArgs;
use crate::os_tools::process::run_with_timeout;

const BC_TIMEOUT: Duration = Duration::from_secs(5);

/// `bc -l` wrapper
#[derive(Debug, Clone, Default)]
pub struct BcTool;

impl Tool for BcTool {
    fn name(&self) -> &str {
        "bc"
    }

    fn description(&self) -> &str {
        "Evaluate math expressions using the system 'bc' calculator (with -l precision)."
    }

    fn schema(&self) -> &str {
        r#"{"expression": "(2 + 2) * 3"}"#
    }

    fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        let expression = required_str(args, "expression")?;

        let mut cmd = Command::new("bc");
        cmd.arg("-l");
        let output = match run_with_timeout(cmd, Some(expression), BC_TIMEOUT, false) {
            Ok(output) => output,
            Err(ToolError::Timeout) => {
                return Err(ToolError::InvalidArguments(
                    "calculation timed out".to_string(),
                ))
            }
            Err(ToolError::Failed(_)) => {
                return Err(ToolError::InvalidArguments(
                    "'bc' is not installed on this system".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        let stdout = output.stdout.trim();
        let stderr = output.stderr.trim();
        if !output.status.success() {
            let detail = if stderr.is_empty() { stdout } else { stderr };
            return Err(ToolError::Failed(format!(
                "bc exited with code {}: {}",
                output.exit_code(),
                detail
            )));
        }

        let mut result = if stdout.is_empty() {
            "0".to_string()
        } else {
            stdout.to_string()
        };
        if !stderr.is_empty() {
            result.push_str("\n[stderr]\n");
            result.push_str(stderr);
        }
        Ok(result)
    }
}
