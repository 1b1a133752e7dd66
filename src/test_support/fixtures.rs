//! Test fixtures: fake executables and a recording fetcher.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::sources::Fetcher;
use crate::util::context::HostEnv;
use crate::util::hash::Checksum;

/// Create executable stub scripts named `names` in `dir` and return a
/// host environment whose PATH is exactly `dir`.
///
/// The directory is created if needed. Stubs exit 0 without output; tests
/// that care about a tool's output script it on a
/// [`ScriptedExecutor`](super::ScriptedExecutor) instead.
pub fn fake_tools(dir: &Path, names: &[&str]) -> HostEnv {
    std::fs::create_dir_all(dir).expect("failed to create fake tool dir");

    for name in names {
        write_stub(&dir.join(name), "#!/bin/sh\nexit 0\n");
    }

    HostEnv::empty(dir).with_path(dir.as_os_str())
}

/// Write an executable script.
pub fn write_stub(path: &Path, script: &str) {
    std::fs::write(path, script).expect("failed to write stub");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)
            .expect("failed to stat stub")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).expect("failed to chmod stub");
    }
}

/// Fake executables for a full GCC build host: compilers plus cmake,
/// ctest, meson, make and git.
pub fn gcc_host(dir: &Path) -> HostEnv {
    fake_tools(
        dir,
        &["gfortran", "gcc", "g++", "cmake", "ctest", "meson", "make", "git"],
    )
}

/// Fake executables for an IBM XL build host.
pub fn ibmxl_host(dir: &Path) -> HostEnv {
    fake_tools(
        dir,
        &["xlf", "xlc", "xlc++", "cmake", "ctest", "meson", "make", "git"],
    )
}

/// One call made through a [`RecordingFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCall {
    Archive {
        url: String,
        dest: PathBuf,
        checksum: Option<Checksum>,
    },
    Extract {
        archive: PathBuf,
        dest: PathBuf,
    },
    Sync {
        dest: PathBuf,
        remote: String,
    },
}

/// Fetcher that records calls and never touches the network.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    calls: RefCell<Vec<FetchCall>>,
    fail_archives: bool,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        RecordingFetcher::default()
    }

    /// A fetcher whose archive downloads fail like a dropped connection.
    pub fn failing_archives() -> Self {
        RecordingFetcher {
            calls: RefCell::new(Vec::new()),
            fail_archives: true,
        }
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.borrow().clone()
    }
}

impl Fetcher for RecordingFetcher {
    fn fetch_archive(&self, url: &str, dest: &Path, checksum: Option<&Checksum>) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Archive {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            checksum: checksum.copied(),
        });

        if self.fail_archives {
            bail!(crate::core::PrereqError::Network {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Extract {
            archive: archive.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        Ok(())
    }

    fn sync_repo(&self, dest: &Path, remote: &str) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Sync {
            dest: dest.to_path_buf(),
            remote: remote.to_string(),
        });
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_fake_tools_are_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let env = fake_tools(&tmp.path().join("bin"), &["cmake"]);

        assert!(env.find_executable("cmake").is_some());
        assert!(env.find_executable("meson").is_none());
    }
}
