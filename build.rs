//! Build script for relcut - generates version information.
//!
//! Produces a human-readable version string for clap's `--version` output:
//! the Cargo package version, a git description (falling back to a
//! pseudo-version `v{version}-{timestamp}-{commit}[+dirty]` when no tags
//! exist or git is unavailable), and the rustc version.

use std::{env, process::Command};

use chrono::Utc;

fn main() {
    ["src", "build.rs", "Cargo.toml", "Cargo.lock"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    let components = [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        git_version().map(|v| format!("({v})")),
        command_stdout("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", components.join(" "));
}

/// Executes a command and returns the trimmed stdout, or None on any failure.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git_command(args: &[&str]) -> Option<String> {
    command_stdout("git", args)
}

/// Describes the current commit, generating a pseudo-version when no tags
/// are reachable or git is not available at all.
fn git_version() -> Option<String> {
    git_command(&["describe", "--tags", "--always", "--dirty"])
        .map(|desc| {
            if !desc.contains('v') && !desc.contains("-g") {
                pseudo_version()
            } else {
                desc
            }
        })
        .or_else(|| Some(pseudo_version()))
}

fn is_git_dirty() -> Option<bool> {
    git_command(&["status", "--porcelain"]).map(|output| !output.is_empty())
}

/// Pseudo-version in the form v{version}-{timestamp}-{commit}[+dirty].
///
/// Clean builds use the commit timestamp (deterministic); dirty builds use
/// the build timestamp.
fn pseudo_version() -> String {
    let commit_hash =
        git_command(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".to_string());

    let is_dirty = is_git_dirty();

    let timestamp = match is_dirty {
        Some(false) => git_command(&["log", "-1", "--format=%ct"])
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|timestamp| chrono::DateTime::from_timestamp(timestamp, 0))
            .map(|dt| dt.format("%Y%m%d%H%M%S").to_string())
            .unwrap_or_else(|| Utc::now().format("%Y%m%d%H%M%S").to_string()),
        _ => Utc::now().format("%Y%m%d%H%M%S").to_string(),
    };

    let dirty_suffix = match is_dirty {
        Some(true) => "+dirty",
        _ => "",
    };
    let version = env!("CARGO_PKG_VERSION");

    format!("v{version}-{timestamp}-{commit_hash}{dirty_suffix}")
}
