//! External build tools (cmake, ctest, meson, make, nice).
//!
//! Tool lookups that shell out are done at most once per run: the first
//! successful lookup is cached in the [`BuildTools`] value the orchestrator
//! creates, and every library build borrows that same value.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};

use anyhow::Result;
use regex::Regex;
use semver::{Version, VersionReq};

use crate::core::PrereqError;
use crate::util::context::{HostEnv, HostOs};
use crate::util::process::{Executor, ProcessBuilder};

/// Oldest CMake the library builds are known to work with.
pub const CMAKE_MIN_VERSION: &str = ">=3.13";

/// Located build tools plus run-wide build parallelism.
#[derive(Debug)]
pub struct BuildTools {
    jobs: usize,
    nice: Option<PathBuf>,
    cmake: OnceLock<PathBuf>,
    meson: OnceLock<PathBuf>,
}

impl BuildTools {
    /// Set up tools for a run.
    ///
    /// `nice` is only used on Linux and only when it is on PATH.
    pub fn new(env: &HostEnv, jobs: usize, use_nice: bool) -> Self {
        let nice = if use_nice && env.os() == HostOs::Linux {
            env.find_executable("nice")
        } else {
            None
        };

        BuildTools {
            jobs: jobs.max(1),
            nice,
            cmake: OnceLock::new(),
            meson: OnceLock::new(),
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Wrap a command so it runs at lowered priority when configured.
    pub fn niced(&self, cmd: ProcessBuilder) -> ProcessBuilder {
        cmd.wrapped_in(self.nice.as_deref())
    }

    /// Locate CMake and check it against [`CMAKE_MIN_VERSION`].
    ///
    /// A CMake that is too old is reported as an error in the log but does
    /// not stop the build.
    pub fn cmake(&self, env: &HostEnv, executor: &dyn Executor) -> Result<&Path> {
        if let Some(cmake) = self.cmake.get() {
            return Ok(cmake);
        }

        let cmake = require(env, "cmake")?;
        check_cmake_version(&cmake, executor);

        Ok(self.cmake.get_or_init(|| cmake))
    }

    /// Locate ctest, preferring the one installed next to CMake.
    pub fn ctest(&self, env: &HostEnv, executor: &dyn Executor) -> Result<PathBuf> {
        let cmake = self.cmake(env, executor)?;
        if let Some(sibling) = cmake.parent().map(|dir| dir.join("ctest")) {
            if sibling.is_file() {
                return Ok(sibling);
            }
        }
        Ok(require(env, "ctest")?)
    }

    /// Locate Meson.
    pub fn meson(&self, env: &HostEnv) -> Result<&Path> {
        if let Some(meson) = self.meson.get() {
            return Ok(meson);
        }

        let meson = require(env, "meson")?;
        Ok(self.meson.get_or_init(|| meson))
    }

    /// Locate make.
    pub fn make(&self, env: &HostEnv) -> Result<PathBuf> {
        Ok(require(env, "make")?)
    }
}

fn require(env: &HostEnv, tool: &str) -> Result<PathBuf, PrereqError> {
    env.find_executable(tool)
        .ok_or_else(|| PrereqError::ToolNotFound {
            tool: tool.to_string(),
            searched: vec![format!("no `{}` on PATH", tool)],
        })
}

fn check_cmake_version(cmake: &Path, executor: &dyn Executor) {
    let output = match executor.capture(&ProcessBuilder::new(cmake).arg("--version")) {
        Ok(output) if output.success() => output,
        Ok(output) => {
            tracing::warn!(
                "`{} --version` exited with {}: {}",
                cmake.display(),
                output.code,
                output.stderr.trim()
            );
            return;
        }
        Err(e) => {
            tracing::warn!("could not query CMake version: {:#}", e);
            return;
        }
    };

    let Some(found) = parse_cmake_version(&output.stdout) else {
        tracing::warn!(
            "could not parse CMake version from: {}",
            output.stdout.lines().next().unwrap_or_default()
        );
        return;
    };

    if let Err(e) = check_minimum("cmake", found, CMAKE_MIN_VERSION) {
        tracing::error!("{}", e);
    } else {
        tracing::debug!("CMake {} at {}", output.stdout.trim(), cmake.display());
    }
}

/// Check a tool version against a requirement.
pub fn check_minimum(tool: &str, found: Version, required: &str) -> Result<(), PrereqError> {
    let Ok(required) = VersionReq::parse(required) else {
        return Ok(());
    };

    if required.matches(&found) {
        Ok(())
    } else {
        Err(PrereqError::ToolVersion {
            tool: tool.to_string(),
            found,
            required,
        })
    }
}

static CMAKE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cmake version (\d+)\.(\d+)(?:\.(\d+))?").expect("cmake version pattern is valid")
});

/// Parse `cmake version 3.20.5` (or `3.20.5-dirty`, `3.28.0-rc1`) output.
pub fn parse_cmake_version(stdout: &str) -> Option<Version> {
    let caps = CMAKE_VERSION_RE.captures(stdout)?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    Some(Version::new(part(1), part(2), part(3)))
}
