//! Test utilities and mocks for unit tests.
//!
//! The build pipeline talks to the outside world through two seams: an
//! [`Executor`] for subprocesses and a [`Fetcher`](crate::sources::Fetcher)
//! for sources. This module provides scripted stand-ins for both, plus
//! fixtures that put fake executables on a private PATH.
//!
//! # Example
//!
//! ```rust,ignore
//! use prereqs::test_support::{CommandPattern, MockProcessOutput, ScriptedExecutor};
//!
//! #[test]
//! fn test_example() {
//!     let exec = ScriptedExecutor::new();
//!     exec.expect(
//!         CommandPattern::Contains("ctest".into()),
//!         MockProcessOutput::failure(8, "2 tests failed"),
//!     );
//!
//!     // Hand `&exec` to a runner, then inspect exec.calls()...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;

use anyhow::Result;

use crate::util::process::{Executor, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            code: self.status,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

#[derive(Debug)]
struct Expectation {
    pattern: CommandPattern,
    output: MockProcessOutput,
    times: Option<usize>,
    used: usize,
}

impl Expectation {
    fn available(&self) -> bool {
        self.times.map_or(true, |n| self.used < n)
    }
}

/// Executor that answers from a script and records every command.
///
/// The first available expectation whose pattern matches wins. Commands
/// that match nothing get the default output, which is a silent success
/// unless changed with [`set_default`](Self::set_default).
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    expectations: RefCell<Vec<Expectation>>,
    runs: RefCell<Vec<ProcessBuilder>>,
    default_output: RefCell<MockProcessOutput>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        ScriptedExecutor::default()
    }

    /// Answer matching commands with `output`.
    pub fn expect(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.expectations.borrow_mut().push(Expectation {
            pattern,
            output,
            times: None,
            used: 0,
        });
        self
    }

    /// Answer the next `times` matching commands with `output`.
    pub fn expect_times(
        &self,
        pattern: CommandPattern,
        output: MockProcessOutput,
        times: usize,
    ) -> &Self {
        self.expectations.borrow_mut().push(Expectation {
            pattern,
            output,
            times: Some(times),
            used: 0,
        });
        self
    }

    /// Set the output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        *self.default_output.borrow_mut() = output;
        self
    }

    /// Command lines in the order they were run.
    pub fn calls(&self) -> Vec<String> {
        self.runs
            .borrow()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    /// Full commands (with env and cwd) in the order they were run.
    pub fn runs(&self) -> Vec<ProcessBuilder> {
        self.runs.borrow().clone()
    }

    fn respond(&self, cmd: &ProcessBuilder) -> MockProcessOutput {
        let line = cmd.display_command();
        self.runs.borrow_mut().push(cmd.clone());

        let mut expectations = self.expectations.borrow_mut();
        for exp in expectations.iter_mut() {
            if exp.available() && exp.pattern.matches(&line) {
                exp.used += 1;
                return exp.output.clone();
            }
        }

        self.default_output.borrow().clone()
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<i32> {
        Ok(self.respond(cmd).status)
    }

    fn capture(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        Ok(self.respond(cmd).to_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_executor_matches_in_order() {
        let exec = ScriptedExecutor::new();
        exec.expect(
            CommandPattern::Exact("cmake --version".to_string()),
            MockProcessOutput::success("cmake version 3.27.0"),
        );
        exec.expect(
            CommandPattern::StartsWith("ctest".to_string()),
            MockProcessOutput::failure(8, "tests failed"),
        );

        let out = exec
            .capture(&ProcessBuilder::new("cmake").arg("--version"))
            .unwrap();
        assert_eq!(out.stdout, "cmake version 3.27.0");
        assert_eq!(exec.run(&ProcessBuilder::new("ctest")).unwrap(), 8);
        assert_eq!(exec.run(&ProcessBuilder::new("make")).unwrap(), 0);
        assert_eq!(exec.calls(), ["cmake --version", "ctest", "make"]);
    }

    #[test]
    fn test_expect_times_is_exhausted() {
        let exec = ScriptedExecutor::new();
        exec.expect_times(CommandPattern::Any, MockProcessOutput::failure(1, ""), 1);

        assert_eq!(exec.run(&ProcessBuilder::new("git")).unwrap(), 1);
        assert_eq!(exec.run(&ProcessBuilder::new("git")).unwrap(), 0);
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = CommandPattern::Regex(r"^meson (setup|install)".to_string());
        assert!(pattern.matches("meson setup build src"));
        assert!(!pattern.matches("meson test -C build"));
    }
}
