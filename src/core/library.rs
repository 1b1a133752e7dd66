//! Library identities and their static build descriptions.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::dirs::BuildDirs;
use crate::core::error::PrereqError;
use crate::util::hash::Checksum;

/// The closed set of libraries the installers know how to build.
///
/// Variant order is the declared build order and is used to break ties
/// between libraries that do not depend on each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LibraryId {
    Hdf5,
    Openmpi,
    Lapack,
    Scalapack,
    Mumps,
}

impl LibraryId {
    pub const ALL: [LibraryId; 5] = [
        LibraryId::Hdf5,
        LibraryId::Openmpi,
        LibraryId::Lapack,
        LibraryId::Scalapack,
        LibraryId::Mumps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryId::Hdf5 => "hdf5",
            LibraryId::Openmpi => "openmpi",
            LibraryId::Lapack => "lapack",
            LibraryId::Scalapack => "scalapack",
            LibraryId::Mumps => "mumps",
        }
    }

    /// Position in the declared build order.
    pub fn declared_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External build system driving a library's compilation.
///
/// Only CMake and Meson can be chosen by the user, on the command line or in
/// the config file; Autoconf is fixed by the libraries that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(try_from = "String")]
pub enum BuildSystem {
    /// `./configure && make install`
    #[value(skip)]
    #[serde(rename = "autoconf")]
    Autoconf,
    #[value(name = "cmake")]
    #[serde(rename = "cmake")]
    CMake,
    #[value(name = "meson")]
    #[serde(rename = "meson")]
    Meson,
}

impl BuildSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSystem::Autoconf => "autoconf",
            BuildSystem::CMake => "cmake",
            BuildSystem::Meson => "meson",
        }
    }
}

impl Default for BuildSystem {
    fn default() -> Self {
        BuildSystem::CMake
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a user-selectable build system.
impl FromStr for BuildSystem {
    type Err = PrereqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cmake" => Ok(BuildSystem::CMake),
            "meson" => Ok(BuildSystem::Meson),
            _ => Err(PrereqError::UnknownBuildSystem {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for BuildSystem {
    type Error = PrereqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Where a library's source comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetchDescriptor {
    /// A release archive, verified against a published digest.
    Archive {
        url: &'static str,
        file_name: &'static str,
        checksum: Option<Checksum>,
    },
    /// A git repository tracked at its default branch.
    Git { remote: &'static str },
}

/// Static description of how one library is fetched and built.
#[derive(Debug, Clone, Copy)]
pub struct LibrarySpec {
    pub id: LibraryId,
    /// Release version for archive sources; `None` tracks the git default branch.
    pub version: Option<&'static str>,
    pub fetch: FetchDescriptor,
    /// Directory name used both under the prefix and under the workdir.
    pub dir_name: &'static str,
    /// Supported build systems, preferred first.
    pub build_systems: &'static [BuildSystem],
    /// Library-specific configure arguments.
    pub extra_args: &'static [&'static str],
    /// Libraries whose install prefixes this one links against.
    pub depends_on: &'static [LibraryId],
    /// Pass the compilers as `CC=`/`CXX=`/`FC=` configure arguments too.
    pub compilers_as_args: bool,
    /// Guidance shown instead of building on Windows hosts.
    pub windows_guidance: Option<&'static str>,
}

impl LibrarySpec {
    pub fn name(&self) -> &'static str {
        self.id.as_str()
    }

    pub fn install_dir(&self, dirs: &BuildDirs) -> PathBuf {
        dirs.prefix.join(self.dir_name)
    }

    pub fn source_dir(&self, dirs: &BuildDirs) -> PathBuf {
        dirs.workdir.join(self.dir_name)
    }

    pub fn build_dir(&self, dirs: &BuildDirs) -> PathBuf {
        self.source_dir(dirs).join("build")
    }

    /// Pick the build system for this library given the user's preference.
    ///
    /// Libraries with a single build system ignore the preference.
    pub fn select_build_system(&self, requested: BuildSystem) -> BuildSystem {
        if self.build_systems.contains(&requested) {
            requested
        } else {
            self.build_systems
                .first()
                .copied()
                .unwrap_or(BuildSystem::Autoconf)
        }
    }
}
