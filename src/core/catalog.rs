//! The fixed set of libraries, versions and checksums.

use crate::core::library::{BuildSystem, FetchDescriptor, LibraryId, LibrarySpec};
use crate::util::hash::Checksum;

const CMAKE_OR_MESON: &[BuildSystem] = &[BuildSystem::CMake, BuildSystem::Meson];
const AUTOCONF: &[BuildSystem] = &[BuildSystem::Autoconf];

pub const HDF5: LibrarySpec = LibrarySpec {
    id: LibraryId::Hdf5,
    version: Some("1.12.0"),
    fetch: FetchDescriptor::Archive {
        url: "https://zenodo.org/record/3700903/files/hdf5-1.12.0.tar.bz2?download=1",
        file_name: "hdf5-1.12.0.tar.bz2",
        checksum: Some(Checksum::md5("1fa68c4b11b6ef7a9d72ffa55995f898")),
    },
    dir_name: "hdf5-1.12.0",
    build_systems: AUTOCONF,
    extra_args: &["--enable-fortran", "--enable-build-mode=production"],
    depends_on: &[],
    compilers_as_args: false,
    windows_guidance: Some(
        "Please use binaries from HDF Group for Windows appropriate for your compiler.",
    ),
};

// OpenMPI 4 needs Scalapack 2.1
pub const OPENMPI: LibrarySpec = LibrarySpec {
    id: LibraryId::Openmpi,
    version: Some("3.1.5"),
    fetch: FetchDescriptor::Archive {
        url: "https://download.open-mpi.org/release/open-mpi/v3.1/openmpi-3.1.5.tar.bz2",
        file_name: "openmpi-3.1.5.tar.bz2",
        checksum: Some(Checksum::sha1("56a74b116c81d4f3704c051a67e4422094ff913d")),
    },
    dir_name: "openmpi-3.1.5",
    build_systems: AUTOCONF,
    extra_args: &[],
    depends_on: &[],
    compilers_as_args: true,
    windows_guidance: Some("OpenMPI is not available in native Windows. Use MS-MPI instead."),
};

pub const LAPACK: LibrarySpec = LibrarySpec {
    id: LibraryId::Lapack,
    version: None,
    fetch: FetchDescriptor::Git {
        remote: "https://github.com/scivision/lapack",
    },
    dir_name: "lapack",
    build_systems: CMAKE_OR_MESON,
    extra_args: &[],
    depends_on: &[],
    compilers_as_args: false,
    windows_guidance: None,
};

pub const SCALAPACK: LibrarySpec = LibrarySpec {
    id: LibraryId::Scalapack,
    version: None,
    fetch: FetchDescriptor::Git {
        remote: "https://github.com/scivision/scalapack",
    },
    dir_name: "scalapack",
    build_systems: CMAKE_OR_MESON,
    extra_args: &[],
    depends_on: &[LibraryId::Lapack],
    compilers_as_args: false,
    windows_guidance: None,
};

pub const MUMPS: LibrarySpec = LibrarySpec {
    id: LibraryId::Mumps,
    version: None,
    fetch: FetchDescriptor::Git {
        remote: "https://github.com/scivision/mumps",
    },
    dir_name: "mumps",
    build_systems: CMAKE_OR_MESON,
    extra_args: &[],
    depends_on: &[LibraryId::Scalapack, LibraryId::Lapack],
    compilers_as_args: false,
    windows_guidance: None,
};

/// Every library, in declared order.
pub static CATALOG: [LibrarySpec; 5] = [HDF5, OPENMPI, LAPACK, SCALAPACK, MUMPS];

/// Look up the static spec for a library.
pub fn spec(id: LibraryId) -> &'static LibrarySpec {
    &CATALOG[id.declared_index()]
}
