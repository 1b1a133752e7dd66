//! Compiler toolchains.
//!
//! A toolchain family names a C/C++/Fortran compiler triple that is meant to
//! be used together. Resolution (in `detect`) turns a family into concrete
//! executable paths exactly once per run; the resulting [`ToolchainSpec`] is
//! immutable and is passed by reference to every library build.
//!
//! Compiler lookup priority, per role:
//! 1. The role's environment variable (`FC`, `CC`, `CXX`), if it names the
//!    family's compiler
//! 2. The family's canonical executable on PATH

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;

use crate::core::LibraryId;

mod detect;

pub use detect::resolve_toolchain;

/// The compiler families the installers support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainFamily {
    /// GNU Compiler Collection
    Gcc,
    /// IBM XL compilers
    #[value(name = "ibmxl")]
    IbmXl,
}

impl ToolchainFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::IbmXl => "ibmxl",
        }
    }

    /// Canonical executable name for a compiler role.
    pub fn compiler_name(&self, role: CompilerRole) -> &'static str {
        match (self, role) {
            (ToolchainFamily::Gcc, CompilerRole::Fortran) => "gfortran",
            (ToolchainFamily::Gcc, CompilerRole::C) => "gcc",
            (ToolchainFamily::Gcc, CompilerRole::Cxx) => "g++",
            (ToolchainFamily::IbmXl, CompilerRole::Fortran) => "xlf",
            (ToolchainFamily::IbmXl, CompilerRole::C) => "xlc",
            (ToolchainFamily::IbmXl, CompilerRole::Cxx) => "xlc++",
        }
    }

    /// Proprietary vendor toolchains ship their own math libraries, so
    /// builds against them do not point at our Lapack/Scalapack installs.
    pub fn is_vendor(&self) -> bool {
        matches!(self, ToolchainFamily::IbmXl)
    }

    /// Name of the default install root under the home directory.
    pub fn default_prefix_dir(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "lib_gcc",
            ToolchainFamily::IbmXl => "lib_xl",
        }
    }

    /// Libraries that can be built with this family.
    pub fn supported_libraries(&self) -> &'static [LibraryId] {
        match self {
            ToolchainFamily::Gcc => &LibraryId::ALL,
            ToolchainFamily::IbmXl => &[
                LibraryId::Hdf5,
                LibraryId::Lapack,
                LibraryId::Scalapack,
                LibraryId::Mumps,
            ],
        }
    }

    pub fn supports(&self, library: LibraryId) -> bool {
        self.supported_libraries().contains(&library)
    }
}

impl fmt::Display for ToolchainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three compiler roles in a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerRole {
    Fortran,
    C,
    Cxx,
}

impl CompilerRole {
    pub const ALL: [CompilerRole; 3] = [CompilerRole::Fortran, CompilerRole::C, CompilerRole::Cxx];

    /// Environment variable that overrides this compiler.
    pub fn env_var(&self) -> &'static str {
        match self {
            CompilerRole::Fortran => "FC",
            CompilerRole::C => "CC",
            CompilerRole::Cxx => "CXX",
        }
    }
}

/// A resolved compiler triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainSpec {
    pub family: ToolchainFamily,
    pub c_compiler: PathBuf,
    pub cxx_compiler: PathBuf,
    pub fortran_compiler: PathBuf,
}

impl ToolchainSpec {
    pub fn compiler(&self, role: CompilerRole) -> &Path {
        match role {
            CompilerRole::Fortran => &self.fortran_compiler,
            CompilerRole::C => &self.c_compiler,
            CompilerRole::Cxx => &self.cxx_compiler,
        }
    }

    /// `FC`/`CC`/`CXX` assignments handed to every build command.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        CompilerRole::ALL
            .iter()
            .map(|role| {
                (
                    role.env_var().to_string(),
                    self.compiler(*role).display().to_string(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_names() {
        assert_eq!(ToolchainFamily::Gcc.compiler_name(CompilerRole::Fortran), "gfortran");
        assert_eq!(ToolchainFamily::IbmXl.compiler_name(CompilerRole::Cxx), "xlc++");
    }

    #[test]
    fn test_vendor_families() {
        assert!(!ToolchainFamily::Gcc.is_vendor());
        assert!(ToolchainFamily::IbmXl.is_vendor());
    }

    #[test]
    fn test_openmpi_is_gcc_only() {
        assert!(ToolchainFamily::Gcc.supports(LibraryId::Openmpi));
        assert!(!ToolchainFamily::IbmXl.supports(LibraryId::Openmpi));
        assert!(ToolchainFamily::IbmXl.supports(LibraryId::Mumps));
    }

    #[test]
    fn test_env_vars_order() {
        let spec = ToolchainSpec {
            family: ToolchainFamily::Gcc,
            c_compiler: PathBuf::from("/usr/bin/gcc"),
            cxx_compiler: PathBuf::from("/usr/bin/g++"),
            fortran_compiler: PathBuf::from("/usr/bin/gfortran"),
        };

        let vars = spec.env_vars();
        assert_eq!(vars[0], ("FC".to_string(), "/usr/bin/gfortran".to_string()));
        assert_eq!(vars[1], ("CC".to_string(), "/usr/bin/gcc".to_string()));
        assert_eq!(vars[2], ("CXX".to_string(), "/usr/bin/g++".to_string()));
    }
}
