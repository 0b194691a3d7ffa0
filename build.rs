// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=QR_SCANNER_VERSION");

    // Packagers can pin the reported version
    let version = std::env::var("QR_SCANNER_VERSION").unwrap_or_else(|_| describe_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version string from `git describe`, falling back to the crate version.
///
/// "v0.1.0" at a tag becomes "0.1.0", "v0.1.0-5-gabcdef1" becomes
/// "0.1.0+abcdef1".
fn describe_version() -> String {
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();

    let described = Command::new("git")
        .args(["describe", "--tags", "--match", "v*"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    let Some(described) = described else {
        return pkg_version;
    };

    let described = described.strip_prefix('v').unwrap_or(&described);
    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if parts.len() == 3 {
        let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        format!("{}+{}", parts[2], hash)
    } else {
        described.to_string()
    }
}
