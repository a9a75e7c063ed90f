//! OS tools: shell commands and the calculator
//!
//! - `run_shell`: `bash -c` in the workspace with a timeout
//! - `bc`: `bc -l` expression evaluation

pub mod bc_calc;
pub mod process;
pub mod run_shell;

pub use bc_calc::BcTool;
pub use process::{run_with_timeout, ProcessOutput};
pub use run_shell::{format_shell_output, RunShellTool};
