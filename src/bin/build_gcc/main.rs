//! Build prerequisite libraries with the GNU compilers.

use prereqs::builder::ToolchainFamily;

fn main() {
    std::process::exit(prereqs::cli::main(ToolchainFamily::Gcc));
}
