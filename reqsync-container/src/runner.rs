//! Blocking subprocess execution.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ContainerError;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status and captured output. Streams are empty when not captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "signal".to_string(),
        }
    }
}

/// Runs commands to completion.
pub trait CommandRunner {
    /// Run `spec` and return its output regardless of exit status.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ContainerError>;

    /// Run `spec`, failing with [`ContainerError::CommandFailed`] on a non-zero exit.
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput, ContainerError> {
        let output = self.run(spec)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ContainerError::CommandFailed {
                command: spec.to_string(),
                status: output.status_text(),
                stderr: output.stderr,
            })
        }
    }
}

/// [`CommandRunner`] backed by `std::process::Command`.
///
/// Uncaptured commands have stderr folded into stdout so Docker build logs
/// are not rendered as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ContainerError> {
        tracing::debug!("running: {spec}");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = spec.cwd.as_deref() {
            command.current_dir(dir);
        }

        let spawn_err = |source| ContainerError::Spawn {
            program: spec.program.clone(),
            source,
        };

        if spec.capture {
            let output = command.output().map_err(spawn_err)?;
            return Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(std::io::stdout())
            .status()
            .map_err(spawn_err)?;
        Ok(CommandOutput {
            code: status.code(),
            ..CommandOutput::default()
        })
    }
}

/// Render a path argument for a [`CommandSpec`].
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted runner for unit tests.

    use std::cell::RefCell;

    use super::*;

    type Matcher = Box<dyn Fn(&CommandSpec) -> bool>;

    /// Replies with the first scripted output whose matcher accepts the
    /// command; unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct FakeRunner {
        script: Vec<(Matcher, CommandOutput)>,
        pub calls: RefCell<Vec<CommandSpec>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reply to commands whose rendered form contains `needle`.
        pub fn on(mut self, needle: &str, output: CommandOutput) -> Self {
            let needle = needle.to_string();
            self.script
                .push((Box::new(move |spec| spec.to_string().contains(&needle)), output));
            self
        }

        pub fn rendered_calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(ToString::to_string).collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ContainerError> {
            self.calls.borrow_mut().push(spec.clone());
            Ok(self
                .script
                .iter()
                .find(|(matches, _)| matches(spec))
                .map(|(_, output)| output.clone())
                .unwrap_or_else(|| ok("")))
        }
    }

    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}
