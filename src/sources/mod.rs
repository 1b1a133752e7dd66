//! Library sources.
//!
//! Sources are fetched either as checksummed release archives or as git
//! checkouts. Plans talk to a [`Fetcher`] so that `--plan` runs and tests
//! never touch the network.

pub mod archive;
pub mod git;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::util::context::HostEnv;
use crate::util::hash::Checksum;
use crate::util::process::Executor;

/// Default download timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Retrieves library sources.
pub trait Fetcher {
    /// Download `url` to `dest`, verifying `checksum` when given.
    fn fetch_archive(&self, url: &str, dest: &Path, checksum: Option<&Checksum>) -> Result<()>;

    /// Unpack an archive into `dest`, dropping its top-level directory.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;

    /// Clone `remote` into `dest`, or pull when `dest` already exists.
    fn sync_repo(&self, dest: &Path, remote: &str) -> Result<()>;
}

/// Fetcher backed by HTTP downloads and the git command line.
pub struct RemoteFetcher<'a> {
    env: &'a HostEnv,
    executor: &'a dyn Executor,
    timeout: Duration,
    progress: bool,
}

impl<'a> RemoteFetcher<'a> {
    pub fn new(env: &'a HostEnv, executor: &'a dyn Executor) -> Self {
        RemoteFetcher {
            env,
            executor,
            timeout: DEFAULT_TIMEOUT,
            progress: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Show a download progress bar.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl Fetcher for RemoteFetcher<'_> {
    fn fetch_archive(&self, url: &str, dest: &Path, checksum: Option<&Checksum>) -> Result<()> {
        archive::download(url, dest, checksum, self.timeout, self.progress)
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        archive::extract(archive, dest)
    }

    fn sync_repo(&self, dest: &Path, remote: &str) -> Result<()> {
        git::sync_repo(self.env, self.executor, dest, remote)
    }
}
