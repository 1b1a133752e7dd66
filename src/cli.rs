//! Command-line front end shared by `build_gcc` and `build_ibmxl`.
//!
//! Both installers take the same arguments; they differ only in the
//! toolchain family, which decides the default prefix and which libraries
//! may be requested.

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use crate::builder::ToolchainFamily;
use crate::core::{BuildDirs, BuildSystem, LibraryId, PrereqError};
use crate::ops::{self, BuildOptions, FailurePolicy};
use crate::sources::{RemoteFetcher, DEFAULT_TIMEOUT};
use crate::util::config::{global_config_path, Config};
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::process::{default_jobs, SystemExecutor};
use crate::util::HostEnv;

/// Default source checkout root, relative to the home directory.
const DEFAULT_WORKDIR: &str = "~/code";

/// Download, build and install prerequisite libraries
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Libraries to build
    #[arg(required = true, num_args = 1.., value_enum)]
    pub libs: Vec<LibraryId>,

    /// Install root; each library goes into its own subdirectory
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Where library sources are downloaded and built
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Start from a clean build-system state
    #[arg(long)]
    pub wipe: bool,

    /// Build system for libraries that support more than one
    #[arg(short = 'b', long, value_enum)]
    pub buildsys: Option<BuildSystem>,

    /// Number of parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Stop after the first library that fails to build
    #[arg(long)]
    pub fail_fast: bool,

    /// Do not run build commands under `nice`
    #[arg(long)]
    pub no_nice: bool,

    /// Print the planned commands as JSON without fetching or building
    #[arg(long)]
    pub plan: bool,

    /// Config file (default: ~/.prereqs/config.toml)
    #[arg(long, env = "PREREQS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse arguments for one installer.
    ///
    /// Libraries the family cannot build are rejected here, as argument
    /// errors, before anything else happens.
    pub fn parse_for<I, T>(family: ToolchainFamily, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = Cli::command().name(installer_name(family));
        let matches = command.try_get_matches_from_mut(args)?;
        let cli = Cli::from_arg_matches(&matches)?;

        if let Some(lib) = cli.libs.iter().find(|lib| !family.supports(**lib)) {
            let supported: Vec<_> = family
                .supported_libraries()
                .iter()
                .map(LibraryId::as_str)
                .collect();
            return Err(command.error(
                ErrorKind::InvalidValue,
                format!(
                    "{} is not available for the {} toolchain (choose from: {})",
                    lib,
                    family,
                    supported.join(", ")
                ),
            ));
        }

        Ok(cli)
    }
}

fn installer_name(family: ToolchainFamily) -> &'static str {
    match family {
        ToolchainFamily::Gcc => "build_gcc",
        ToolchainFamily::IbmXl => "build_ibmxl",
    }
}

/// Entry point for an installer binary. Returns the process exit code.
pub fn main(family: ToolchainFamily) -> i32 {
    let cli = Cli::parse_for(family, std::env::args_os()).unwrap_or_else(|e| e.exit());

    init_logging(cli.verbose);

    match run(family, &cli) {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            1
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("prereqs=debug")
        } else {
            EnvFilter::new("prereqs=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(e: &anyhow::Error) {
    let color = std::io::stderr().is_terminal();

    match e.downcast_ref::<PrereqError>() {
        Some(err) => {
            let mut diag = err.to_diagnostic();
            // Outer context (which library was being fetched or built).
            for cause in e.chain().take_while(|c| c.downcast_ref::<PrereqError>().is_none()) {
                diag = diag.with_context(cause.to_string());
            }
            diagnostic::emit(&diag, color);
        }
        None => eprintln!("error: {:#}", e),
    }
}

/// Run one installer invocation and return its exit code.
pub fn run(family: ToolchainFamily, cli: &Cli) -> Result<i32> {
    let env = HostEnv::capture()?;
    let config = load_config(cli, &env);
    let opts = build_options(family, cli, &config, &env);

    tracing::debug!(
        "prefix={} workdir={} buildsys={} jobs={}",
        opts.dirs.prefix.display(),
        opts.dirs.workdir.display(),
        opts.build_system,
        opts.jobs
    );

    let executor = SystemExecutor;

    if cli.plan {
        let plan = ops::plan(&opts, &env, &executor)?;
        let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
        println!("{}", json);
        return Ok(0);
    }

    let timeout = config
        .net
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);
    let fetcher = RemoteFetcher::new(&env, &executor)
        .with_timeout(timeout)
        .with_progress(!cli.verbose);

    let report = ops::build(&opts, &env, &executor, &fetcher)?;

    let failed = report.failed().count();
    if failed > 0 {
        let mut diag = Diagnostic::error(format!(
            "{} of {} libraries failed to build",
            failed,
            report.results.len()
        ));
        for result in report.failed() {
            let phase = result
                .failed_phase
                .map(|p| format!(" during {}", p))
                .unwrap_or_default();
            diag = diag.with_context(format!(
                "{}: exit code {}{}",
                result.library, result.exit_code, phase
            ));
        }
        diagnostic::emit(&diag.with_suggestion(suggestions::BUILD_FAILED), std::io::stderr().is_terminal());
    }

    Ok(report.exit_code())
}

fn load_config(cli: &Cli, env: &HostEnv) -> Config {
    let path = match (&cli.config, env.home()) {
        (Some(path), _) => path.clone(),
        (None, Some(home)) => global_config_path(home),
        (None, None) => return Config::default(),
    };

    if cli.config.is_some() && !path.exists() {
        tracing::warn!("config file {} does not exist", path.display());
    }
    Config::load_or_default(&path)
}

/// Merge command line, config file and defaults (in that order of
/// precedence).
pub fn build_options(
    family: ToolchainFamily,
    cli: &Cli,
    config: &Config,
    env: &HostEnv,
) -> BuildOptions {
    let prefix = cli
        .prefix
        .clone()
        .or_else(|| config.build.prefix.clone())
        .unwrap_or_else(|| Path::new("~").join(family.default_prefix_dir()));
    let workdir = cli
        .workdir
        .clone()
        .or_else(|| config.build.workdir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKDIR));

    let failure_policy = if cli.fail_fast || config.build.fail_fast.unwrap_or(false) {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::KeepGoing
    };

    BuildOptions {
        libraries: cli.libs.clone(),
        family,
        dirs: BuildDirs::resolve(&prefix, &workdir, env),
        build_system: cli
            .buildsys
            .or(config.build.buildsys)
            .unwrap_or_default(),
        wipe: cli.wipe,
        jobs: cli.jobs.or(config.build.jobs).unwrap_or_else(default_jobs),
        nice: !cli.no_nice && config.build.nice.unwrap_or(true),
        failure_policy,
    }
}
