//! Implementation of `build_gcc` / `build_ibmxl`.
//!
//! The orchestrator validates the request, orders libraries so that
//! dependencies build first, checks platform support for every library,
//! resolves the toolchain once and then builds each library in turn.
//! Nothing is fetched or built until all of those checks pass.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::Serialize;

use crate::builder::{
    check_platform, resolve_toolchain, BuildResult, BuildTools, LibraryBuildPlan,
    NativeBuildRunner, Pipeline, ToolchainFamily, ToolchainSpec,
};
use crate::core::{spec, BuildDirs, BuildSystem, FetchDescriptor, LibraryId, PrereqError};
use crate::sources::Fetcher;
use crate::util::context::HostEnv;
use crate::util::process::Executor;

/// What to do after a library fails to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Build the remaining libraries anyway.
    #[default]
    KeepGoing,
    /// Stop at the first failed library.
    FailFast,
}

/// Options for a build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Requested libraries, in any order
    pub libraries: Vec<LibraryId>,

    /// Compiler family to build with
    pub family: ToolchainFamily,

    /// Install and source roots
    pub dirs: BuildDirs,

    /// Preferred build system for libraries that support several
    pub build_system: BuildSystem,

    /// Start from a clean build-system state
    pub wipe: bool,

    /// Parallel jobs for the external build tools
    pub jobs: usize,

    /// Run build commands under `nice` (Linux only)
    pub nice: bool,

    pub failure_policy: FailurePolicy,
}

/// Results of every library built in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<BuildResult>,
}

impl RunReport {
    /// Exit code of the run: the last non-zero library result, or zero.
    pub fn exit_code(&self) -> i32 {
        self.results
            .iter()
            .rev()
            .find(|r| !r.is_success())
            .map_or(0, |r| r.exit_code)
    }

    pub fn failed(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// Planned work for one library.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedLibrary {
    pub library: LibraryId,
    /// Release version; absent for git checkouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
    pub fetch: FetchDescriptor,
    pub source_dir: PathBuf,
    pub install_dir: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_dependencies: Vec<LibraryId>,
    pub pipeline: Pipeline,
}

/// Everything a run would do, without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub toolchain: ToolchainSpec,
    pub dirs: BuildDirs,
    pub libraries: Vec<PlannedLibrary>,
}

/// Order libraries so every dependency comes before its dependents.
///
/// Only requested libraries are scheduled; a dependency that is not
/// requested is assumed to be installed already. Libraries that do not
/// depend on each other keep the declared catalog order.
pub fn build_order(libraries: &[LibraryId]) -> Result<Vec<LibraryId>, PrereqError> {
    order_by(libraries, |id| spec(id).depends_on)
}

fn order_by<'d>(
    libraries: &[LibraryId],
    depends_on: impl Fn(LibraryId) -> &'d [LibraryId],
) -> Result<Vec<LibraryId>, PrereqError> {
    // Edge dep -> lib: dep must be built before lib.
    let mut graph: DiGraphMap<LibraryId, ()> = DiGraphMap::new();
    for &lib in libraries {
        graph.add_node(lib);
    }
    for &lib in libraries {
        for &dep in depends_on(lib) {
            if graph.contains_node(dep) {
                graph.add_edge(dep, lib, ());
            }
        }
    }

    let mut indegree: BTreeMap<LibraryId, usize> = graph
        .nodes()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    // BTreeSet pops in declared order, which breaks ties.
    let mut ready: BTreeSet<LibraryId> = indegree
        .iter()
        .filter(|&(_, &d)| d == 0)
        .map(|(&n, _)| n)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for succ in graph.neighbors_directed(next, Direction::Outgoing) {
            if let Some(d) = indegree.get_mut(&succ) {
                *d -= 1;
                if *d == 0 {
                    ready.insert(succ);
                }
            }
        }
    }

    if order.len() < graph.node_count() {
        let mut cyclic: Vec<LibraryId> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .collect();
        cyclic.sort();

        return Err(PrereqError::DependencyCycle {
            libraries: cyclic.iter().map(|id| id.to_string()).collect(),
        });
    }

    Ok(order)
}

/// Checks shared by [`build`] and [`plan`]: toolchain support, ordering,
/// platform guards and compiler resolution, in that order.
fn prepare(opts: &BuildOptions, env: &HostEnv) -> Result<(Vec<LibraryId>, ToolchainSpec)> {
    for &lib in &opts.libraries {
        if !opts.family.supports(lib) {
            return Err(PrereqError::LibraryNotSupported {
                library: lib.to_string(),
                toolchain: opts.family.to_string(),
            }
            .into());
        }
    }

    let order = build_order(&opts.libraries)?;

    for &lib in &order {
        check_platform(spec(lib), env)?;
    }

    let toolchain = resolve_toolchain(opts.family, env)?;
    Ok((order, toolchain))
}

/// Build the requested libraries.
///
/// A library whose build fails does not abort the run unless the policy is
/// [`FailurePolicy::FailFast`]; its result is recorded in the report.
/// Setup problems (missing tools, failed downloads, bad checksums) are
/// returned as errors.
pub fn build(
    opts: &BuildOptions,
    env: &HostEnv,
    executor: &dyn Executor,
    fetcher: &dyn Fetcher,
) -> Result<RunReport> {
    let (order, toolchain) = prepare(opts, env)?;
    let tools = BuildTools::new(env, opts.jobs, opts.nice);
    let runner = NativeBuildRunner::new(env, executor, &tools);

    let names: Vec<_> = order.iter().map(LibraryId::as_str).collect();
    tracing::info!("Building {} into {}", names.join(", "), opts.dirs.prefix.display());

    let mut report = RunReport::default();

    for &lib in &order {
        let plan = LibraryBuildPlan::new(lib, &opts.dirs, &toolchain, opts.build_system, opts.wipe);
        warn_missing_dependencies(&plan, &order, &opts.dirs);

        match plan.spec.version {
            Some(version) => tracing::info!("{} {}: {}", lib, version, plan.build_system()),
            None => tracing::info!("{}: {}", lib, plan.build_system()),
        }

        plan.fetch(fetcher)
            .with_context(|| format!("failed to fetch {}", lib))?;

        let result = runner
            .run(&plan.request())
            .with_context(|| format!("failed to build {}", lib))?;

        if result.is_success() {
            tracing::info!("{} installed to {}", lib, plan.install_dir().display());
        }

        let stop = !result.is_success() && opts.failure_policy == FailurePolicy::FailFast;
        report.results.push(result);
        if stop {
            tracing::warn!("stopping after {} failed", lib);
            break;
        }
    }

    for failed in report.failed() {
        tracing::error!("{} failed with exit code {}", failed.library, failed.exit_code);
    }

    Ok(report)
}

/// Resolve everything a run would do without fetching or building.
pub fn plan(opts: &BuildOptions, env: &HostEnv, executor: &dyn Executor) -> Result<RunPlan> {
    let (order, toolchain) = prepare(opts, env)?;
    let tools = BuildTools::new(env, opts.jobs, opts.nice);
    let runner = NativeBuildRunner::new(env, executor, &tools);

    let mut libraries = Vec::with_capacity(order.len());
    for &lib in &order {
        let plan = LibraryBuildPlan::new(lib, &opts.dirs, &toolchain, opts.build_system, opts.wipe);
        libraries.push(PlannedLibrary {
            library: lib,
            version: plan.spec.version,
            fetch: plan.spec.fetch,
            source_dir: plan.source_dir(),
            install_dir: plan.install_dir(),
            missing_dependencies: plan.missing_dependencies(&order),
            pipeline: runner.pipeline(&plan.request())?,
        });
    }

    Ok(RunPlan {
        toolchain,
        dirs: opts.dirs.clone(),
        libraries,
    })
}

fn warn_missing_dependencies(plan: &LibraryBuildPlan<'_>, scheduled: &[LibraryId], dirs: &BuildDirs) {
    for dep in plan.missing_dependencies(scheduled) {
        tracing::warn!(
            "{} needs {}, which is not part of this run and is not installed at {}",
            plan.library(),
            dep,
            spec(dep).install_dir(dirs).display()
        );
    }
}
