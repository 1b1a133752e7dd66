//! Library builds.
//!
//! This module resolves compilers, locates build tools and turns each
//! library's plan into a pipeline of external build-system commands.

pub(crate) mod autoconf;
pub(crate) mod cmake;
pub(crate) mod meson;
pub mod plan;
pub mod runner;
pub mod toolchain;
pub mod tools;

pub use plan::{check_platform, LibraryBuildPlan};
pub use runner::{BuildRequest, BuildResult, BuildStep, NativeBuildRunner, Phase, Pipeline, StepAction};
pub use toolchain::{resolve_toolchain, CompilerRole, ToolchainFamily, ToolchainSpec};
pub use tools::BuildTools;
