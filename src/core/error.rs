//! Installer error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::hash::HashAlgorithm;

/// Errors with a defined meaning for the build run.
///
/// `ToolVersion` is the one non-fatal kind: it is logged and the build
/// carries on. Everything else aborts the run.
#[derive(Debug, Error)]
pub enum PrereqError {
    #[error("required tool `{tool}` not found")]
    ToolNotFound { tool: String, searched: Vec<String> },

    #[error("{tool} {found} is older than the required {required}")]
    ToolVersion {
        tool: String,
        found: semver::Version,
        required: semver::VersionReq,
    },

    #[error("{library} cannot be built from source on {platform}")]
    UnsupportedPlatform {
        library: String,
        platform: String,
        guidance: String,
    },

    #[error("{algorithm} checksum mismatch for {}", .file.display())]
    Integrity {
        file: PathBuf,
        algorithm: HashAlgorithm,
        expected: String,
        actual: String,
    },

    #[error("failed to download {url}: {message}")]
    Network { url: String, message: String },

    #[error("dependency cycle between: {}", .libraries.join(", "))]
    DependencyCycle { libraries: Vec<String> },

    #[error("{library} is not available for the {toolchain} toolchain")]
    LibraryNotSupported { library: String, toolchain: String },

    #[error("`{name}` is not a selectable build system")]
    UnknownBuildSystem { name: String },
}

impl PrereqError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            PrereqError::ToolNotFound { tool, searched } => {
                let mut diag = diag;
                for place in searched {
                    diag = diag.with_context(place.clone());
                }
                if matches!(tool.as_str(), "cmake" | "ctest" | "meson" | "make") {
                    diag.with_suggestion(suggestions::INSTALL_BUILD_TOOL)
                } else {
                    diag.with_suggestion(suggestions::SET_COMPILER_ENV)
                }
            }

            PrereqError::ToolVersion { tool, .. } => Diagnostic::warning(self.to_string())
                .with_suggestion(format!("Upgrade {} if the build fails", tool)),

            PrereqError::UnsupportedPlatform { guidance, .. } => {
                diag.with_suggestion(guidance.clone())
            }

            PrereqError::Integrity {
                expected, actual, ..
            } => diag
                .with_context(format!("expected: {}", expected))
                .with_context(format!("actual:   {}", actual))
                .with_suggestion(suggestions::CHECKSUM_FAILED),

            PrereqError::Network { .. } => diag.with_suggestion(suggestions::FETCH_FAILED),

            PrereqError::DependencyCycle { .. } => diag,

            PrereqError::LibraryNotSupported { .. } => {
                diag.with_suggestion("Build it with the GCC installer (`build_gcc`) instead")
            }

            PrereqError::UnknownBuildSystem { .. } => {
                diag.with_suggestion("Choose `cmake` or `meson`")
            }
        }
    }
}
