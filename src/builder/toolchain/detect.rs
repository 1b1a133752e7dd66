//! Toolchain resolution.

use std::path::PathBuf;

use crate::core::PrereqError;
use crate::util::context::HostEnv;

use super::{CompilerRole, ToolchainFamily, ToolchainSpec};

/// Resolve the compiler triple for a family.
///
/// Fails with [`PrereqError::ToolNotFound`] as soon as one role cannot be
/// located through either its environment override or PATH. Call this once
/// per run; the returned spec does not track later environment changes.
pub fn resolve_toolchain(
    family: ToolchainFamily,
    env: &HostEnv,
) -> Result<ToolchainSpec, PrereqError> {
    let fortran_compiler = resolve_compiler(family, CompilerRole::Fortran, env)?;
    let c_compiler = resolve_compiler(family, CompilerRole::C, env)?;
    let cxx_compiler = resolve_compiler(family, CompilerRole::Cxx, env)?;

    tracing::info!(
        "Using {} toolchain: FC={} CC={} CXX={}",
        family,
        fortran_compiler.display(),
        c_compiler.display(),
        cxx_compiler.display()
    );

    Ok(ToolchainSpec {
        family,
        c_compiler,
        cxx_compiler,
        fortran_compiler,
    })
}

fn resolve_compiler(
    family: ToolchainFamily,
    role: CompilerRole,
    env: &HostEnv,
) -> Result<PathBuf, PrereqError> {
    let expected = family.compiler_name(role);
    let var = role.env_var();
    let mut searched = Vec::new();

    match env.var(var) {
        Some(value) if value.contains(expected) => {
            if let Some(path) = env.find_executable(value) {
                tracing::debug!("{} from environment: {}", var, path.display());
                return Ok(path);
            }
            tracing::warn!(
                "{}={} names {} but is not an executable, searching PATH",
                var,
                value,
                expected
            );
            searched.push(format!("{}={} is not an executable", var, value));
        }
        Some(value) => {
            tracing::debug!("ignoring {}={}: not a {} compiler", var, value, expected);
            searched.push(format!("{}={} does not name `{}`", var, value, expected));
        }
        None => searched.push(format!("{} is not set", var)),
    }

    if let Some(path) = env.find_executable(expected) {
        tracing::debug!("{} from PATH: {}", var, path.display());
        return Ok(path);
    }
    searched.push(format!("no `{}` on PATH", expected));

    Err(PrereqError::ToolNotFound {
        tool: expected.to_string(),
        searched,
    })
}
