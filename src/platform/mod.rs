//! Supported platforms and the release host's naming for each of them.
//!
//! The set is closed: adding a platform means adding a variant here, and the
//! compiler then points at every lookup table that needs a new arm.

mod detection;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed (operating system, CPU architecture) pair.
///
/// Serialized with the identifiers used as keys in the persisted mapping
/// (`linux-x64`, `macos-arm64`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linux-x64")]
    LinuxX64,
    #[serde(rename = "linux-arm64")]
    LinuxArm64,
    #[serde(rename = "macos-x64")]
    MacosX64,
    #[serde(rename = "macos-arm64")]
    MacosArm64,
    #[serde(rename = "windows-x64")]
    WindowsX64,
}

impl Platform {
    /// Every supported platform, in the order they are probed.
    pub const ALL: [Platform; 5] = [
        Platform::LinuxX64,
        Platform::LinuxArm64,
        Platform::MacosX64,
        Platform::MacosArm64,
        Platform::WindowsX64,
    ];

    /// Identifier used in the persisted mapping and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Platform::LinuxX64 => "linux-x64",
            Platform::LinuxArm64 => "linux-arm64",
            Platform::MacosX64 => "macos-x64",
            Platform::MacosArm64 => "macos-arm64",
            Platform::WindowsX64 => "windows-x64",
        }
    }

    /// Target name the release host puts in asset file names.
    pub fn asset_target(self) -> &'static str {
        match self {
            Platform::LinuxX64 => "linux-x64",
            Platform::LinuxArm64 => "linux-aarch64",
            Platform::MacosX64 => "darwin-x64",
            Platform::MacosArm64 => "darwin-aarch64",
            Platform::WindowsX64 => "windows-x64",
        }
    }

    /// Detect the platform this binary was compiled for.
    ///
    /// Returns `None` on hosts outside the supported set.
    pub fn detect() -> Option<Self> {
        detection::detect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Platform::ALL.iter().find(|p| p.id() == s) {
            Some(platform) => Ok(*platform),
            None => {
                let known: Vec<&str> = Platform::ALL.iter().map(|p| p.id()).collect();
                bail!("Unknown platform '{}'. Expected one of: {}", s, known.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.id().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_ids_and_targets_are_unique() {
        let ids: HashSet<_> = Platform::ALL.iter().map(|p| p.id()).collect();
        let targets: HashSet<_> = Platform::ALL.iter().map(|p| p.asset_target()).collect();
        assert_eq!(ids.len(), Platform::ALL.len());
        assert_eq!(targets.len(), Platform::ALL.len());
    }

    #[test]
    fn test_asset_target_naming() {
        assert_eq!(Platform::MacosArm64.asset_target(), "darwin-aarch64");
        assert_eq!(Platform::LinuxArm64.asset_target(), "linux-aarch64");
        assert_eq!(Platform::WindowsX64.asset_target(), "windows-x64");
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "freebsd-x64".parse::<Platform>().unwrap_err();
        assert!(err.to_string().contains("freebsd-x64"));
        assert!(err.to_string().contains("linux-x64"));
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Platform::MacosX64).unwrap();
        assert_eq!(json, r#""macos-x64""#);
        let parsed: Platform = serde_json::from_str(r#""windows-x64""#).unwrap();
        assert_eq!(parsed, Platform::WindowsX64);
    }

    #[test]
    fn test_display_matches_id() {
        assert_eq!(Platform::LinuxX64.to_string(), "linux-x64");
    }
}
