//! Build prerequisite libraries with the IBM XL compilers.

use prereqs::builder::ToolchainFamily;

fn main() {
    std::process::exit(prereqs::cli::main(ToolchainFamily::IbmXl));
}
