//! Executor backed by real subprocesses

use crate::effect::{error_output, stream_child_output, ExecOutput, Execution, Executor, OutputMode};
use crate::error::{JvmLayerError, JvmLayerResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Spawns each execution with `tokio::process` and waits for it to exit
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    fn command(execution: &Execution) -> Command {
        let mut command = Command::new(&execution.command);
        command
            .args(&execution.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &execution.dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, execution: &Execution) -> JvmLayerResult<ExecOutput> {
        debug!("Executing: {}", execution.display());
        let mut command = Self::command(execution);

        let (status, stdout, stderr) = match execution.output {
            OutputMode::Capture => {
                let output = command
                    .output()
                    .await
                    .map_err(|e| JvmLayerError::command_failed(execution.display(), e))?;
                (
                    output.status,
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                )
            }
            OutputMode::Forward => {
                let mut child = command
                    .spawn()
                    .map_err(|e| JvmLayerError::command_failed(execution.display(), e))?;
                let (stdout, stderr) = stream_child_output(&mut child).await;
                let status = child
                    .wait()
                    .await
                    .map_err(|e| JvmLayerError::command_failed(execution.display(), e))?;
                (status, stdout, stderr)
            }
        };

        if !status.success() {
            return Err(JvmLayerError::CommandExit {
                command: execution.display(),
                code: status.code().unwrap_or(-1),
                output: error_output(&stdout, &stderr),
            });
        }

        Ok(ExecOutput { stdout, stderr })
    }
}
