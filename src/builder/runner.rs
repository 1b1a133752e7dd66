//! Native build runner.
//!
//! Turns a [`BuildRequest`] into a [`Pipeline`] of steps for the library's
//! build system and executes it. Every build system follows the same policy:
//! steps run in order, and the first step that exits non-zero ends the
//! pipeline and becomes the library's [`BuildResult`]. The runner returns;
//! it never terminates the process.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::builder::tools::BuildTools;
use crate::builder::{autoconf, cmake, meson};
use crate::core::{BuildSystem, LibraryId};
use crate::util::context::HostEnv;
use crate::util::fs::{ensure_dir, remove_file_if_exists};
use crate::util::process::{Executor, ProcessBuilder};

/// Stage of a library build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Clearing stale build-system state before configuring.
    Prepare,
    Configure,
    Test,
    /// Building and installing into the prefix.
    Install,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prepare => "prepare",
            Phase::Configure => "configure",
            Phase::Test => "test",
            Phase::Install => "install",
        };
        f.write_str(name)
    }
}

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Run { command: ProcessBuilder },
    RemoveFile { path: PathBuf },
}

/// One step in a library's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStep {
    pub phase: Phase,
    #[serde(flatten)]
    pub action: StepAction,
}

impl BuildStep {
    pub fn run(phase: Phase, command: ProcessBuilder) -> Self {
        BuildStep {
            phase,
            action: StepAction::Run { command },
        }
    }

    pub fn remove_file(path: PathBuf) -> Self {
        BuildStep {
            phase: Phase::Prepare,
            action: StepAction::RemoveFile { path },
        }
    }

    /// The command this step runs, if any.
    pub fn command(&self) -> Option<&ProcessBuilder> {
        match &self.action {
            StepAction::Run { command } => Some(command),
            StepAction::RemoveFile { .. } => None,
        }
    }
}

/// Everything the runner needs to build one library.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub library: LibraryId,
    pub build_system: BuildSystem,
    /// Library-specific configure arguments (the install prefix argument is
    /// added by the runner).
    pub args: Vec<String>,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
    pub wipe: bool,
    /// Compiler variables for every command.
    pub env: Vec<(String, String)>,
}

/// Ordered steps for one library.
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    pub library: LibraryId,
    pub build_system: BuildSystem,
    pub steps: Vec<BuildStep>,
}

impl Pipeline {
    /// Commands run by this pipeline, in order.
    pub fn commands(&self) -> impl Iterator<Item = &ProcessBuilder> {
        self.steps.iter().filter_map(BuildStep::command)
    }
}

/// Outcome of one library build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    pub library: LibraryId,
    pub exit_code: i32,
    /// The step that failed, when `exit_code` is non-zero.
    pub failed_phase: Option<Phase>,
}

impl BuildResult {
    pub fn success(library: LibraryId) -> Self {
        BuildResult {
            library,
            exit_code: 0,
            failed_phase: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Drives a single external build system invocation.
pub struct NativeBuildRunner<'a> {
    env: &'a HostEnv,
    executor: &'a dyn Executor,
    tools: &'a BuildTools,
}

impl<'a> NativeBuildRunner<'a> {
    pub fn new(env: &'a HostEnv, executor: &'a dyn Executor, tools: &'a BuildTools) -> Self {
        NativeBuildRunner {
            env,
            executor,
            tools,
        }
    }

    /// Assemble the pipeline for a request without running anything.
    ///
    /// Locating the build tool happens here, so a missing CMake or Meson is
    /// reported before any step runs.
    pub fn pipeline(&self, req: &BuildRequest) -> Result<Pipeline> {
        let steps = match req.build_system {
            BuildSystem::Autoconf => autoconf::steps(req, self.tools, self.env)?,
            BuildSystem::CMake => cmake::steps(req, self.tools, self.env, self.executor)?,
            BuildSystem::Meson => meson::steps(req, self.tools, self.env)?,
        };

        Ok(Pipeline {
            library: req.library,
            build_system: req.build_system,
            steps,
        })
    }

    /// Execute a pipeline, stopping at the first failing step.
    pub fn execute(&self, pipeline: &Pipeline) -> Result<BuildResult> {
        for step in &pipeline.steps {
            match &step.action {
                StepAction::RemoveFile { path } => {
                    if remove_file_if_exists(path)? {
                        tracing::info!("Removed {}", path.display());
                    }
                }
                StepAction::Run { command } => {
                    tracing::info!("{} {}: {}", pipeline.library, step.phase, command.display_command());

                    if let Some(cwd) = command.get_cwd() {
                        ensure_dir(cwd)?;
                    }
                    let code = self.executor.run(command)?;
                    if code != 0 {
                        tracing::error!(
                            "{} {} failed with exit code {}",
                            pipeline.library,
                            step.phase,
                            code
                        );
                        return Ok(BuildResult {
                            library: pipeline.library,
                            exit_code: code,
                            failed_phase: Some(step.phase),
                        });
                    }
                }
            }
        }

        Ok(BuildResult::success(pipeline.library))
    }

    /// Assemble and execute in one go.
    pub fn run(&self, req: &BuildRequest) -> Result<BuildResult> {
        let pipeline = self.pipeline(req)?;
        self.execute(&pipeline)
    }
}
