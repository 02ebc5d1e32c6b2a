//! Process-backed test executor.
//!
//! Each test runs in its own child process. The child reports progress and
//! its final result as newline-delimited JSON on stdout, and may ask for
//! referenced content, which is written back to its stdin:
//!
//! ```text
//! child  -> {"kind":"partial","llm_response":"Hel"}
//! child  -> {"kind":"read_file","path":"images/cat.png"}
//! parent -> {"path":"images/cat.png","content":[137,80,78,71]}
//! child  -> {"kind":"result","status":0,"llm_response":"Hello"}
//! ```
//!
//! Lines that are not JSON messages are logged and ignored, so harnesses can
//! keep printing diagnostics to stdout.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::config::{ProcessExecutorOptions, FUNCTION_ENV, RUNTIME_ENV};
use crate::error::{RunnerError, RunnerResult};
use crate::executor::{ContentResolver, FunctionHandle, ProgressSink, RuntimeHandle, TestExecutor};
use crate::result::{ExecutionResponse, ExecutionResult};

/// A message emitted by the child on stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ProcessMessage {
    Partial(ExecutionResponse),
    ReadFile { path: String },
    Result(ExecutionResult),
}

/// Reply written to the child's stdin for a `read_file` request.
#[derive(Debug, Serialize)]
struct ContentReply<'a> {
    path: &'a str,
    content: Vec<u8>,
}

/// Runs each test by spawning a configured program.
///
/// The test name is passed as the last argument; the selected runtime and
/// function are passed through the environment.
pub struct ProcessExecutor {
    options: ProcessExecutorOptions,
}

impl ProcessExecutor {
    pub fn new(options: ProcessExecutorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessExecutorOptions {
        &self.options
    }

    fn build_command(
        &self,
        runtime: &RuntimeHandle,
        function: &FunctionHandle,
        test_name: &str,
    ) -> Command {
        let mut cmd = Command::new(&self.options.program);
        cmd.args(&self.options.args)
            .arg(test_name)
            .env(RUNTIME_ENV, &runtime.id)
            .env(FUNCTION_ENV, &function.name)
            .envs(&self.options.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    async fn reply_content(
        stdin: &mut Option<ChildStdin>,
        path: &str,
        content: Vec<u8>,
    ) -> RunnerResult<()> {
        let Some(stdin) = stdin.as_mut() else {
            return Err(RunnerError::InvalidOutput(
                "content requested but stdin is closed".to_string(),
            ));
        };
        let mut payload = serde_json::to_vec(&ContentReply { path, content })?;
        payload.push(b'\n');
        stdin.write_all(&payload).await?;
        stdin.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TestExecutor for ProcessExecutor {
    async fn run_test(
        &self,
        runtime: &RuntimeHandle,
        function: &FunctionHandle,
        test_name: &str,
        progress: &dyn ProgressSink,
        resolver: &dyn ContentResolver,
    ) -> RunnerResult<ExecutionResult> {
        debug!("Executing: {}", self.options.display_command(test_name));

        let mut child = self
            .build_command(runtime, function, test_name)
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                program: self.options.program.clone(),
                message: e.to_string(),
            })?;

        let mut stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut output).await;
            output
        });

        let mut lines = BufReader::new(stdout).split(b'\n');
        let mut result: Option<ExecutionResult> = None;

        while let Some(raw) = lines.next_segment().await? {
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ProcessMessage>(line) {
                Ok(ProcessMessage::Partial(response)) => progress.on_intermediate(response),
                Ok(ProcessMessage::ReadFile { path }) => {
                    // A failed lookup fails the whole test; the child is killed on drop.
                    let content = resolver.resolve(&path).await?;
                    Self::reply_content(&mut stdin, &path, content).await?;
                }
                Ok(ProcessMessage::Result(r)) => {
                    if result.is_some() {
                        warn!(test = test_name, "Ignoring duplicate result line");
                    } else {
                        result = Some(r);
                    }
                }
                Err(e) => debug!(test = test_name, "Ignoring non-protocol line ({}): {}", e, line),
            }
        }

        drop(stdin);
        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        match result {
            Some(result) => {
                if !status.success() {
                    warn!(
                        test = test_name,
                        "Process exited with {:?} after reporting a result",
                        status.code()
                    );
                }
                info!(test = test_name, status = %result.status, "Test process finished");
                Ok(result)
            }
            None => Err(RunnerError::NoResult {
                code: status.code(),
                stderr: stderr_output
                    .lines()
                    .last()
                    .unwrap_or("no output")
                    .to_string(),
            }),
        }
    }
}
