//! Install and checkout roots shared by every library in a run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::util::context::HostEnv;
use crate::util::fs::{absolutize, expand_home};

/// Absolute install root and source checkout root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDirs {
    /// Install root; each library installs into its own subdirectory.
    pub prefix: PathBuf,
    /// Source root; each library is checked out or extracted into its own
    /// subdirectory.
    pub workdir: PathBuf,
}

impl BuildDirs {
    /// Expand `~` and make both roots absolute against the host's cwd.
    pub fn resolve(prefix: &Path, workdir: &Path, env: &HostEnv) -> Self {
        let resolve = |p: &Path| absolutize(&expand_home(p, env.home()), env.cwd());

        BuildDirs {
            prefix: resolve(prefix),
            workdir: resolve(workdir),
        }
    }
}
