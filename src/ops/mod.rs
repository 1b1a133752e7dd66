//! High-level operations.
//!
//! This module contains the implementation of the installer commands.

pub mod prereqs_build;

pub use prereqs_build::{
    build, build_order, plan, BuildOptions, FailurePolicy, PlannedLibrary, RunPlan, RunReport,
};
