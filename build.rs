use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let version = match git_describe() {
        Some(described) if described.ends_with("-dirty") => {
            format!("{}-{}", described, timestamp())
        }
        Some(described) => described,
        None => format!("0.0.0-unknown-{}", timestamp()),
    };

    println!("cargo:rustc-env=RELEASE_PINS_VERSION={}", version);
}

/// `git describe` output without a leading `v`, if git knows the tree.
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    let described = described.strip_prefix('v').unwrap_or(described);
    (!described.is_empty()).then(|| described.to_string())
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
