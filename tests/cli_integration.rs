//! CLI integration tests for the installers.
//!
//! Builds run against stub executables on a private PATH, so nothing here
//! touches the network or a real compiler.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn build_gcc() -> Command {
    Command::cargo_bin("build_gcc").unwrap()
}

fn build_ibmxl() -> Command {
    Command::cargo_bin("build_ibmxl").unwrap()
}

/// Write an executable stub that exits with `code`.
#[cfg(unix)]
fn stub(dir: &Path, name: &str, code: i32) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\nexit {}\n", code)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A scratch home with stub GCC compilers and build tools on its PATH.
#[cfg(unix)]
fn gcc_sandbox() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    for tool in ["gfortran", "gcc", "g++", "cmake", "ctest", "meson", "make", "git"] {
        stub(&bin, tool, 0);
    }
    tmp
}

/// Point a command at a sandbox: private PATH and HOME, no compiler overrides.
fn sandboxed(mut cmd: Command, home: &Path) -> Command {
    cmd.env("PATH", home.join("bin"))
        .env("HOME", home)
        .env_remove("FC")
        .env_remove("CC")
        .env_remove("CXX")
        .env_remove("PREREQS_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn test_help_lists_options() {
    build_gcc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--prefix"))
        .stdout(predicate::str::contains("--workdir"))
        .stdout(predicate::str::contains("--buildsys"));
}

#[test]
fn test_requires_a_library() {
    build_gcc().assert().failure().code(2);
}

#[test]
fn test_unknown_library_is_rejected() {
    build_gcc()
        .arg("petsc")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("petsc"));
}

#[test]
fn test_ibmxl_rejects_openmpi() {
    build_ibmxl()
        .args(["lapack", "openmpi"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(
            "openmpi is not available for the ibmxl toolchain",
        ));
}

#[test]
fn test_invalid_build_system() {
    build_gcc()
        .args(["lapack", "--buildsys", "scons"])
        .assert()
        .failure()
        .code(2);
}

// ============================================================================
// --plan
// ============================================================================

#[cfg(unix)]
#[test]
fn test_plan_prints_pipeline_json() {
    let home = gcc_sandbox();

    let output = sandboxed(build_gcc(), home.path())
        .args(["mumps", "lapack", "--plan", "--prefix", "~/opt"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let libs = plan["libraries"].as_array().unwrap();
    assert_eq!(libs.len(), 2);
    assert_eq!(libs[0]["library"], "lapack");
    assert_eq!(libs[1]["library"], "mumps");

    let prefix = home.path().join("opt");
    assert_eq!(plan["dirs"]["prefix"], prefix.display().to_string());

    let configure_args = libs[1]["pipeline"]["steps"][0]["command"]["args"]
        .as_array()
        .unwrap();
    assert!(configure_args
        .iter()
        .any(|a| a == &format!("-DLAPACK_ROOT={}", prefix.join("lapack").display())));

    // Nothing was fetched.
    assert!(!home.path().join("code").exists());
}

#[cfg(unix)]
#[test]
fn test_config_file_selects_build_system() {
    let home = gcc_sandbox();
    let config = home.path().join("prereqs.toml");
    fs::write(&config, "[build]\nbuildsys = \"meson\"\n").unwrap();

    sandboxed(build_gcc(), home.path())
        .args(["lapack", "--plan", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"build_system\": \"meson\""));
}

#[cfg(unix)]
#[test]
fn test_missing_compiler_is_reported() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("bin")).unwrap();

    sandboxed(build_gcc(), home.path())
        .args(["lapack", "--plan"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("required tool `gfortran` not found"));
}

// ============================================================================
// Builds
// ============================================================================

#[cfg(unix)]
#[test]
fn test_build_succeeds_with_working_tools() {
    let home = gcc_sandbox();

    sandboxed(build_gcc(), home.path())
        .args(["lapack", "--workdir", "work", "--prefix", "prefix"])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_exit_code_is_failing_test_suite() {
    let home = gcc_sandbox();
    stub(&home.path().join("bin"), "ctest", 8);

    sandboxed(build_gcc(), home.path())
        .args(["lapack", "--workdir", "work"])
        .assert()
        .failure()
        .code(8)
        .stderr(predicate::str::contains("lapack: exit code 8 during test"));
}

#[cfg(unix)]
#[test]
fn test_meson_failure_stops_before_install() {
    let home = gcc_sandbox();
    stub(&home.path().join("bin"), "meson", 5);

    sandboxed(build_gcc(), home.path())
        .args(["scalapack", "-b", "meson", "--workdir", "work"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("during configure"));
}
