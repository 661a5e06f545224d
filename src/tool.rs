//! External tool invocation.
//!
//! Every step of the workflow shells out to an Apple command-line tool. A
//! [`ToolRunner`] runs one command to completion and hands back its exit code
//! and captured output. A nonzero exit is not an error at this layer: each
//! caller decides what failure means through [`ToolOutput::check`].

use crate::error::{NotaryError, Result};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a nonzero exit into [`NotaryError::ToolFailed`] carrying `message`
    /// and the captured stderr.
    pub fn check(self, program: &str, message: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }

        Err(NotaryError::ToolFailed {
            message: message.to_string(),
            program: program.to_string(),
            code: self.code,
            stderr: self.stderr.trim_end().to_string(),
        })
    }
}

/// Runs external commands.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Run `program` with `args` and wait for it to exit.
    ///
    /// Only a failure to start the process is an `Err`.
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput>;
}

impl<R: ToolRunner> ToolRunner for &R {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput> {
        (**self).run(program, args).await
    }
}

/// [`ToolRunner`] backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    verbose: bool,
}

impl SystemRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo each command line before running it.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl ToolRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput> {
        if self.verbose {
            info!("$ {}", display_command(program, args));
        }

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| NotaryError::CommandExecution(format!("{program} failed to start: {e}")))?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a command line for display, masking password arguments.
#[must_use]
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut rendered = vec![program.to_string()];
    let mut mask_next = false;

    for arg in args {
        if mask_next {
            rendered.push("********".to_string());
            mask_next = false;
            continue;
        }
        mask_next = arg == "-p" || arg == "--password";

        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push(format!("'{arg}'"));
        } else {
            rendered.push(arg.clone());
        }
    }

    rendered.join(" ")
}
