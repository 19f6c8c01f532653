//! External tool execution
//!
//! Assembly steps never spawn processes directly; they describe an
//! [`Execution`] and hand it to an [`Executor`], so tests can substitute a
//! recording fake.

mod command;
#[cfg(test)]
pub(crate) mod fake;

pub use command::CommandExecutor;

use crate::error::JvmLayerResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Max number of output lines to include in command error messages.
const ERROR_TAIL_LINES: usize = 50;

/// What to do with a subprocess's stdout/stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect output and return it to the caller
    Capture,
    /// Log every line as it arrives
    Forward,
}

/// A single subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub output: OutputMode,
}

impl Execution {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            dir: None,
            output: OutputMode::Capture,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn forward_output(mut self) -> Self {
        self.output = OutputMode::Forward;
        self
    }

    /// Command line for logs and error messages
    pub fn display(&self) -> String {
        let mut parts = vec![self.command.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Output of a successful execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs executions; a non-zero exit is an error
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, execution: &Execution) -> JvmLayerResult<ExecOutput>;
}

/// Extract the useful tail of command output for error diagnostics.
pub(crate) fn error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail = if total > ERROR_TAIL_LINES {
        &lines[total - ERROR_TAIL_LINES..]
    } else {
        &lines[..]
    };
    tail.join("\n")
}

/// Stream stdout+stderr from a child process into the log.
///
/// Returns the collected (stdout, stderr) text for error reporting.
pub(crate) async fn stream_child_output(child: &mut tokio::process::Child) -> (String, String) {
    let mut stdout_lines = child.stdout.take().map(|s| BufReader::new(s).lines());
    let mut stderr_lines = child.stderr.take().map(|s| BufReader::new(s).lines());

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut stdout_done = stdout_lines.is_none();
    let mut stderr_done = stderr_lines.is_none();

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = async { stdout_lines.as_mut()?.next_line().await.ok().flatten() }, if !stdout_done => {
                match line {
                    Some(line) => {
                        info!("{}", line);
                        stdout.push_str(&line);
                        stdout.push('\n');
                    }
                    None => stdout_done = true,
                }
            }
            line = async { stderr_lines.as_mut()?.next_line().await.ok().flatten() }, if !stderr_done => {
                match line {
                    Some(line) => {
                        info!("{}", line);
                        stderr.push_str(&line);
                        stderr.push('\n');
                    }
                    None => stderr_done = true,
                }
            }
        }
    }

    (stdout, stderr)
}
