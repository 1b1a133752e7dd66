//! Meson pipeline: `meson setup`, `meson test`, `meson install`.

use anyhow::Result;

use crate::builder::runner::{BuildRequest, BuildStep, Phase};
use crate::builder::tools::BuildTools;
use crate::util::context::HostEnv;
use crate::util::process::ProcessBuilder;

pub(crate) fn steps(req: &BuildRequest, tools: &BuildTools, env: &HostEnv) -> Result<Vec<BuildStep>> {
    let meson = tools.meson(env)?.to_path_buf();

    let mut setup = ProcessBuilder::new(&meson)
        .arg("setup")
        .arg(format!("--prefix={}", req.install_dir.display()))
        .args(&req.args);

    // Meson refuses --wipe on a directory it never configured.
    if req.wipe && req.build_dir.join("build.ninja").is_file() {
        setup = setup.arg("--wipe");
    }

    let setup = setup
        .arg(&req.build_dir)
        .arg(&req.source_dir)
        .envs(&req.env);

    let test = ProcessBuilder::new(&meson)
        .arg("test")
        .arg("-C")
        .arg(&req.build_dir)
        .arg(format!("--num-processes={}", tools.jobs()))
        .envs(&req.env);

    let install = ProcessBuilder::new(&meson)
        .arg("install")
        .arg("-C")
        .arg(&req.build_dir)
        .envs(&req.env);

    Ok(vec![
        BuildStep::run(Phase::Configure, tools.niced(setup)),
        BuildStep::run(Phase::Test, tools.niced(test)),
        BuildStep::run(Phase::Install, tools.niced(install)),
    ])
}
