//! Autoconf pipeline: `./configure` then a parallel `make install`.

use anyhow::Result;

use crate::builder::runner::{BuildRequest, BuildStep, Phase};
use crate::builder::tools::BuildTools;
use crate::util::context::HostEnv;
use crate::util::process::ProcessBuilder;

pub(crate) fn steps(req: &BuildRequest, tools: &BuildTools, env: &HostEnv) -> Result<Vec<BuildStep>> {
    let make = tools.make(env)?;

    let configure = ProcessBuilder::new(req.source_dir.join("configure"))
        .arg(format!("--prefix={}", req.install_dir.display()))
        .args(&req.args)
        .envs(&req.env)
        .cwd(&req.source_dir);

    let install = ProcessBuilder::new(make)
        .arg("-C")
        .arg(&req.source_dir)
        .arg(format!("-j{}", tools.jobs()))
        .arg("install")
        .envs(&req.env)
        .cwd(&req.source_dir);

    Ok(vec![
        BuildStep::run(Phase::Configure, tools.niced(configure)),
        BuildStep::run(Phase::Install, tools.niced(install)),
    ])
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::{BuildSystem, LibraryId};
    use crate::test_support::fake_tools;
    use std::path::PathBuf;

    #[test]
    fn test_configure_then_make_install() {
        let tmp = tempfile::TempDir::new().unwrap();
        let env = fake_tools(tmp.path(), &["make"]);
        let tools = BuildTools::new(&env, 4, false);

        let req = BuildRequest {
            library: LibraryId::Hdf5,
            build_system: BuildSystem::Autoconf,
            args: vec!["--enable-fortran".to_string()],
            source_dir: PathBuf::from("/work/hdf5-1.12.0"),
            build_dir: PathBuf::from("/work/hdf5-1.12.0/build"),
            install_dir: PathBuf::from("/opt/lib_gcc/hdf5-1.12.0"),
            wipe: false,
            env: vec![("CC".to_string(), "/usr/bin/gcc".to_string())],
        };

        let steps = steps(&req, &tools, &env).unwrap();
        assert_eq!(steps.len(), 2);

        let configure = steps[0].command().unwrap();
        assert_eq!(configure.get_program(), PathBuf::from("/work/hdf5-1.12.0/configure"));
        assert_eq!(
            configure.get_args(),
            ["--prefix=/opt/lib_gcc/hdf5-1.12.0", "--enable-fortran"]
        );
        assert_eq!(configure.get_cwd(), Some(req.source_dir.as_path()));
        assert_eq!(configure.get_env()["CC"], "/usr/bin/gcc");

        let install = steps[1].command().unwrap();
        assert_eq!(steps[1].phase, Phase::Install);
        assert_eq!(install.get_args(), ["-C", "/work/hdf5-1.12.0", "-j4", "install"]);
    }
}
