//! Prerequisite library installers for the Gemini toolchain
//!
//! This crate downloads, configures, builds and installs a fixed set of
//! numerical libraries (HDF5, OpenMPI, Lapack, Scalapack, MUMPS) with a
//! chosen compiler family, driving each library's own build system.

pub mod builder;
pub mod cli;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted process executor, a recording fetcher and fake
/// executables on a private PATH.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildDirs, BuildSystem, LibraryId, LibrarySpec, PrereqError};
pub use ops::{BuildOptions, RunReport};
pub use util::context::HostEnv;
