//! Subprocess execution utilities.
//!
//! Build steps never spawn processes directly. They assemble a
//! [`ProcessBuilder`] and hand it to an [`Executor`], which lets the
//! orchestrator swap in a recording executor for `--plan` and for tests.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use serde::Serialize;

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set several environment variables.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run the whole command under a wrapper program such as `nice`.
    pub fn wrapped_in(self, wrapper: Option<&Path>) -> Self {
        match wrapper {
            Some(wrapper) => {
                let mut wrapped = ProcessBuilder::new(wrapper);
                wrapped.args.push(self.program.display().to_string());
                wrapped.args.extend(self.args);
                wrapped.env = self.env;
                wrapped.cwd = self.cwd;
                wrapped
            }
            None => self,
        }
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the environment overrides.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a process whose output we need to inspect.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs processes on behalf of the build pipeline.
pub trait Executor {
    /// Run the command with inherited stdio and return its exit code.
    fn run(&self, cmd: &ProcessBuilder) -> Result<i32>;

    /// Run the command and capture its output.
    fn capture(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput>;
}

/// Executor that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<i32> {
        tracing::debug!("running `{}`", cmd.display_command());

        let status = cmd
            .build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", cmd.program.display()))?;

        Ok(exit_code(status))
    }

    fn capture(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        let output = cmd
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn `{}`", cmd.program.display()))?;

        Ok(ProcessOutput {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Map an exit status to a shell-style exit code.
///
/// A process killed by a signal reports `128 + signal`, like a POSIX shell.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Number of parallel jobs to hand to external build tools.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
