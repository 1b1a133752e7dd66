//! Core data types: libraries, their catalog, directories and errors.

pub mod catalog;
pub mod dirs;
pub mod error;
pub mod library;

pub use catalog::{spec, CATALOG};
pub use dirs::BuildDirs;
pub use error::PrereqError;
pub use library::{BuildSystem, FetchDescriptor, LibraryId, LibrarySpec};
