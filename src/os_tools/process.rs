//! Subprocess execution with a deadline
//!
//! Pipes are drained on their own threads while the main thread waits, so
//! a chatty child can never fill a pipe and stall past its timeout. The
//! deadline also covers collecting the output: a background grandchild
//! that keeps a pipe open does not extend the call.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::execution_engine::ToolError;

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Exit code, -1 when killed by a signal
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>, echo: bool) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut captured = String::new();
        let Some(pipe) = pipe else {
            let _ = tx.send(captured);
            return;
        };
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    if echo {
                        print!("{}", text);
                        let _ = std::io::stdout().flush();
                    }
                    captured.push_str(&text);
                }
            }
        }
        let _ = tx.send(captured);
    });
    rx
}

/// Wait for a drain thread until `deadline`
fn collect(rx: &Receiver<String>, deadline: Instant) -> Result<String, ToolError> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Ok(text),
        Err(RecvTimeoutError::Timeout) => Err(ToolError::Timeout),
        Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
    }
}

/// Spawn `cmd`, optionally feed `stdin`, and wait up to `timeout`
///
/// The child is killed and [`ToolError::Timeout`] returned when the
/// deadline passes. With `echo`, output lines are mirrored to the terminal
/// as they arrive.
pub fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<&str>,
    timeout: Duration,
    echo: bool,
) -> Result<ProcessOutput, ToolError> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let deadline = Instant::now() + timeout;
    let mut child = cmd
        .spawn()
        .map_err(|e| ToolError::Failed(format!("failed to start command: {}", e)))?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes())?;
        if !input.ends_with('\n') {
            pipe.write_all(b"\n")?;
        }
        // dropping the pipe closes the child's stdin
    }

    let stdout = drain(child.stdout.take(), echo);
    let stderr = drain(child.stderr.take(), echo);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolError::Timeout);
        }
        Err(e) => {
            let _ = child.kill();
            return Err(ToolError::Io(e));
        }
    };

    let stdout = collect(&stdout, deadline)?;
    let stderr = collect(&stderr, deadline)?;
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}
