/// Subprocess execution
///
/// Spawns a program, captures stdout/stderr and reports the exit code as data.
/// A non-zero exit is never an error at this layer; callers decide.
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// Capture output without echoing it to the step log
    pub silent: bool,
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn exec(
        &self,
        program: &Path,
        args: &[String],
        options: ExecOptions,
    ) -> Result<ExecutionResult>;
}

/// Runs real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read a child stream to the end
///
/// Output is collected as raw bytes and decoded lossily, so a stray non-UTF-8
/// byte from gcloud never turns a finished run into a read error.
async fn drain<R>(reader: R, stream: Stream, silent: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if !silent {
            let text = String::from_utf8_lossy(&line);
            match stream {
                Stream::Stdout => print!("{}", text),
                Stream::Stderr => eprint!("{}", text),
            }
        }
        captured.extend_from_slice(&line);
    }

    Ok(String::from_utf8_lossy(&captured).into_owned())
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn exec(
        &self,
        program: &Path,
        args: &[String],
        options: ExecOptions,
    ) -> Result<ExecutionResult> {
        debug!(
            operation = "exec",
            program = %program.display(),
            "{} {}",
            program.display(),
            args.join(" ")
        );

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program.display()))?;

        let stdout = child
            .stdout
            .take()
            .context("Child stdout was not captured")?;
        let stderr = child
            .stderr
            .take()
            .context("Child stderr was not captured")?;

        // The child is always reaped, even when reading its output failed.
        let (stdout, stderr, status) = tokio::join!(
            drain(stdout, Stream::Stdout, options.silent),
            drain(stderr, Stream::Stderr, options.silent),
            child.wait(),
        );
        let status = status.context("Failed to wait for child process")?;
        let stdout = stdout.context("Failed to read child stdout")?;
        let stderr = stderr.context("Failed to read child stderr")?;

        let exit_code = status.code().unwrap_or(-1);
        debug!(operation = "exec", exit_code, "process finished");

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
        })
    }
}
