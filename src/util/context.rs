//! Host environment snapshot.
//!
//! Everything the build needs to know about the machine it runs on (the
//! environment variables, the executable search path, the home directory
//! and the operating system family) is captured once into a [`HostEnv`]
//! and passed by reference. Nothing below the CLI reads `std::env` directly,
//! so a resolved toolchain never changes when the process environment does.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

/// Operating system family of the build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl HostOs {
    /// The family this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            HostOs::Linux
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Other
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, HostOs::Windows)
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostOs::Linux => "linux",
            HostOs::MacOs => "macos",
            HostOs::Windows => "windows",
            HostOs::Other => "unknown",
        };
        f.write_str(name)
    }
}

/// Immutable view of the host: variables, PATH, home and cwd.
#[derive(Debug, Clone)]
pub struct HostEnv {
    vars: HashMap<String, String>,
    path: Option<OsString>,
    cwd: PathBuf,
    home: Option<PathBuf>,
    os: HostOs,
}

impl HostEnv {
    /// Snapshot the current process environment.
    pub fn capture() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to determine current directory")?;

        Ok(HostEnv {
            vars: std::env::vars().collect(),
            path: std::env::var_os("PATH"),
            cwd,
            home: BaseDirs::new().map(|b| b.home_dir().to_path_buf()),
            os: HostOs::current(),
        })
    }

    /// An empty environment rooted at `cwd`; used to build isolated hosts.
    pub fn empty(cwd: impl Into<PathBuf>) -> Self {
        HostEnv {
            vars: HashMap::new(),
            path: None,
            cwd: cwd.into(),
            home: None,
            os: HostOs::current(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<OsString>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_os(mut self, os: HostOs) -> Self {
        self.os = os;
        self
    }

    /// Look up an environment variable. Empty values count as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn os(&self) -> HostOs {
        self.os
    }

    /// Find an executable by name (or verify an explicit path) on this
    /// host's search path.
    pub fn find_executable(&self, name: impl AsRef<std::ffi::OsStr>) -> Option<PathBuf> {
        which::which_in(name, self.path.as_ref(), &self.cwd).ok()
    }
}
