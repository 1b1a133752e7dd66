//! CMake pipeline.
//!
//! Configure into an out-of-source build directory, build the `install`
//! target in parallel, then run the test suite with ctest. A stale
//! `CMakeCache.txt` is removed first when a wipe is requested, so cached
//! compiler choices from an earlier toolchain do not leak into the build.

use anyhow::Result;

use crate::builder::runner::{BuildRequest, BuildStep, Phase};
use crate::builder::tools::BuildTools;
use crate::util::context::HostEnv;
use crate::util::process::{Executor, ProcessBuilder};

pub(crate) fn steps(
    req: &BuildRequest,
    tools: &BuildTools,
    env: &HostEnv,
    executor: &dyn Executor,
) -> Result<Vec<BuildStep>> {
    let cmake = tools.cmake(env, executor)?.to_path_buf();
    let ctest = tools.ctest(env, executor)?;

    let mut steps = Vec::with_capacity(4);

    let cache = req.build_dir.join("CMakeCache.txt");
    if req.wipe && cache.is_file() {
        steps.push(BuildStep::remove_file(cache));
    }

    let configure = ProcessBuilder::new(&cmake)
        .arg(format!("-DCMAKE_INSTALL_PREFIX={}", req.install_dir.display()))
        .args(&req.args)
        .arg("-B")
        .arg(&req.build_dir)
        .arg("-S")
        .arg(&req.source_dir)
        .envs(&req.env);
    steps.push(BuildStep::run(Phase::Configure, tools.niced(configure)));

    let install = ProcessBuilder::new(&cmake)
        .arg("--build")
        .arg(&req.build_dir)
        .arg("--parallel")
        .arg(tools.jobs().to_string())
        .args(["--target", "install"])
        .envs(&req.env);
    steps.push(BuildStep::run(Phase::Install, tools.niced(install)));

    let test = ProcessBuilder::new(ctest)
        .arg("--parallel")
        .arg(tools.jobs().to_string())
        .arg("--output-on-failure")
        .envs(&req.env)
        .cwd(&req.build_dir);
    steps.push(BuildStep::run(Phase::Test, tools.niced(test)));

    Ok(steps)
}
