use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Shape of the stdout a command is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContract {
    /// A JSON array of ads; blank output means no ads.
    JsonArray,
    /// `KEY = value` lines with `#` comments.
    ConfigDump,
    /// A single value on stdout.
    ScalarText,
}

/// One external process call: program, argument vector and output contract.
///
/// Arguments are passed to the OS as a vector and never joined into a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    args: Vec<String>,
    contract: OutputContract,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>, contract: OutputContract) -> Self {
        Self { program: program.into(), args: Vec::new(), contract }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_pair(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn contract(&self) -> OutputContract {
        self.contract
    }

    /// Program followed by its arguments.
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)).collect()
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.tokens())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { exit_code: Some(0), stdout: stdout.into(), stderr: String::new() }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self { exit_code: Some(exit_code), stdout: String::new(), stderr: stderr.into() }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Diagnostic text of a failed run: stderr, or stdout when stderr is blank.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.trim().is_empty() {
            return self.stderr.trim().to_string();
        }
        if !self.stdout.trim().is_empty() {
            return self.stdout.trim().to_string();
        }
        match self.exit_code {
            Some(code) => format!("command exited with status {}", code),
            None => "command was terminated by a signal".to_string(),
        }
    }
}

/// Executes a [`CommandInvocation`] exactly once.
#[async_trait]
pub trait CommandRunner: fmt::Debug + Send + Sync {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput>;
}

/// Runs invocations as child processes, bounded by a deadline.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput> {
        log::debug!("Running {}", invocation);

        let child = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    Error::ServiceUnavailable(format!("Unable to start '{}': {}", invocation.program(), e))
                }
                _ => Error::IoError(e),
            })?;

        // Dropping the child on timeout kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                log::warn!("{} did not finish within {:?}", invocation, self.timeout);
                return Err(Error::Timeout(format!(
                    "'{}' did not finish within {} seconds",
                    invocation.program(),
                    self.timeout.as_secs_f64()
                )));
            }
        };

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        log::debug!("{} exited with {:?}", invocation.program(), output.exit_code);

        Ok(output)
    }
}
