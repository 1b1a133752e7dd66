//! Per-library build plans.
//!
//! A plan binds one static [`LibrarySpec`] to the run's directories,
//! toolchain and options. It knows how to fetch the library's source and
//! how to describe the build to the [`NativeBuildRunner`], but it does not
//! decide ordering or failure policy; that is the orchestrator's job.
//!
//! [`NativeBuildRunner`]: crate::builder::runner::NativeBuildRunner

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::runner::BuildRequest;
use crate::builder::toolchain::ToolchainSpec;
use crate::core::{spec, BuildDirs, BuildSystem, FetchDescriptor, LibraryId, LibrarySpec, PrereqError};
use crate::sources::Fetcher;
use crate::util::context::HostEnv;

/// Build plan for one library in one run.
#[derive(Debug, Clone)]
pub struct LibraryBuildPlan<'a> {
    pub spec: &'static LibrarySpec,
    dirs: &'a BuildDirs,
    toolchain: &'a ToolchainSpec,
    build_system: BuildSystem,
    wipe: bool,
}

impl<'a> LibraryBuildPlan<'a> {
    /// Create a plan. `requested` is the user's build system preference;
    /// libraries that only support one system use that one instead.
    pub fn new(
        library: LibraryId,
        dirs: &'a BuildDirs,
        toolchain: &'a ToolchainSpec,
        requested: BuildSystem,
        wipe: bool,
    ) -> Self {
        let spec = spec(library);
        LibraryBuildPlan {
            spec,
            dirs,
            toolchain,
            build_system: spec.select_build_system(requested),
            wipe,
        }
    }

    pub fn library(&self) -> LibraryId {
        self.spec.id
    }

    pub fn build_system(&self) -> BuildSystem {
        self.build_system
    }

    pub fn source_dir(&self) -> PathBuf {
        self.spec.source_dir(self.dirs)
    }

    pub fn install_dir(&self) -> PathBuf {
        self.spec.install_dir(self.dirs)
    }

    /// Download or sync the library's source into the workdir.
    pub fn fetch(&self, fetcher: &dyn Fetcher) -> Result<()> {
        let source_dir = self.source_dir();

        match self.spec.fetch {
            FetchDescriptor::Archive {
                url,
                file_name,
                checksum,
            } => {
                let archive = self.dirs.workdir.join(file_name);
                fetcher.fetch_archive(url, &archive, checksum.as_ref())?;
                fetcher
                    .extract(&archive, &source_dir)
                    .with_context(|| format!("failed to unpack {}", self.spec.name()))?;
            }
            FetchDescriptor::Git { remote } => {
                fetcher.sync_repo(&source_dir, remote)?;
            }
        }

        Ok(())
    }

    /// `-D<DEP>_ROOT=<prefix>/<dep dir>` for each dependency.
    ///
    /// Vendor toolchains bring their own math libraries, so nothing is
    /// referenced for them.
    pub fn dependency_args(&self) -> Vec<String> {
        if self.toolchain.family.is_vendor() {
            return Vec::new();
        }

        self.spec
            .depends_on
            .iter()
            .map(|dep| {
                format!(
                    "-D{}_ROOT={}",
                    dep.as_str().to_ascii_uppercase(),
                    spec(*dep).install_dir(self.dirs).display()
                )
            })
            .collect()
    }

    /// Configure arguments, not including the install prefix.
    pub fn configure_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.spec.extra_args.iter().map(|s| s.to_string()).collect();

        if self.spec.compilers_as_args {
            args.push(format!("CC={}", self.toolchain.c_compiler.display()));
            args.push(format!("CXX={}", self.toolchain.cxx_compiler.display()));
            args.push(format!("FC={}", self.toolchain.fortran_compiler.display()));
        }

        args.extend(self.dependency_args());
        args
    }

    /// What the runner needs to build this library.
    pub fn request(&self) -> BuildRequest {
        BuildRequest {
            library: self.library(),
            build_system: self.build_system,
            args: self.configure_args(),
            source_dir: self.source_dir(),
            build_dir: self.spec.build_dir(self.dirs),
            install_dir: self.install_dir(),
            wipe: self.wipe,
            env: self.toolchain.env_vars(),
        }
    }

    /// Referenced dependencies that are neither scheduled in this run nor
    /// already installed under the prefix.
    pub fn missing_dependencies(&self, scheduled: &[LibraryId]) -> Vec<LibraryId> {
        if self.toolchain.family.is_vendor() {
            return Vec::new();
        }

        self.spec
            .depends_on
            .iter()
            .copied()
            .filter(|dep| !scheduled.contains(dep))
            .filter(|dep| !spec(*dep).install_dir(self.dirs).is_dir())
            .collect()
    }
}

/// Refuse libraries that cannot be built from source on this host.
pub fn check_platform(spec: &LibrarySpec, env: &HostEnv) -> Result<(), PrereqError> {
    match spec.windows_guidance {
        Some(guidance) if env.os().is_windows() => Err(PrereqError::UnsupportedPlatform {
            library: spec.name().to_string(),
            platform: env.os().to_string(),
            guidance: guidance.to_string(),
        }),
        _ => Ok(()),
    }
}
