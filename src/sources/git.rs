//! Git checkouts tracked at their default branch.

use std::path::Path;

use anyhow::{bail, Result};

use crate::util::context::HostEnv;
use crate::util::fs::ensure_dir;
use crate::util::process::{Executor, ProcessBuilder};

/// Clone `remote` into `dest`, or pull when a checkout already exists.
///
/// Without a `git` executable the existing source tree (if any) is used as
/// is. A failed clone is an error since there is nothing to build; a failed
/// pull only means building a stale checkout.
pub fn sync_repo(env: &HostEnv, executor: &dyn Executor, dest: &Path, remote: &str) -> Result<()> {
    let Some(git) = env.find_executable("git") else {
        tracing::warn!("git not available, not updating {}", dest.display());
        return Ok(());
    };

    if dest.exists() {
        tracing::info!("Updating {}", dest.display());
        // `pull` from inside the checkout; older git releases lack `-C`.
        let code = executor.run(&ProcessBuilder::new(&git).arg("pull").cwd(dest))?;
        if code != 0 {
            tracing::warn!("git pull in {} exited with {}", dest.display(), code);
        }
        return Ok(());
    }

    tracing::info!("Cloning {}", remote);
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }

    let code = executor.run(&ProcessBuilder::new(&git).arg("clone").arg(remote).arg(dest))?;
    if code != 0 {
        bail!("failed to clone {} (git exited with {})", remote, code);
    }

    Ok(())
}
