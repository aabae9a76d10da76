//! The version mapping: version → platform → release entry.

use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::IndexError;
use crate::platform::Platform;
use crate::version::compare_versions;

/// One downloadable asset for one (version, platform) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseEntry {
    pub url: String,
    /// Lowercase hex SHA-256 of the asset bytes.
    pub sha256: String,
    pub version: String,
}

pub type PlatformEntries = BTreeMap<Platform, ReleaseEntry>;

/// All known versions and their per-platform entries.
///
/// Serializes as an object keyed by version, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VersionMapping {
    versions: BTreeMap<String, PlatformEntries>,
}

impl VersionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the entries of one version, replacing any previous ones.
    pub fn insert(&mut self, version: String, entries: PlatformEntries) {
        self.versions.insert(version, entries);
    }

    pub fn get(&self, version: &str) -> Option<&PlatformEntries> {
        self.versions.get(version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterate versions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlatformEntries)> {
        self.versions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check the structural invariants every persisted mapping must hold.
    pub fn validate(&self) -> Result<(), IndexError> {
        for (version, entries) in &self.versions {
            if semver::Version::parse(version).is_err() {
                return Err(IndexError::InvalidMapping(format!(
                    "'{}' is not a semantic version",
                    version
                )));
            }
            if entries.is_empty() {
                return Err(IndexError::InvalidMapping(format!(
                    "version {} has no platform entries",
                    version
                )));
            }
            for (platform, entry) in entries {
                if entry.version != *version {
                    return Err(IndexError::InvalidMapping(format!(
                        "{}/{} carries version '{}'",
                        version, platform, entry.version
                    )));
                }
                if !(entry.url.starts_with("https://") || entry.url.starts_with("http://")) {
                    return Err(IndexError::InvalidMapping(format!(
                        "{}/{} has a non-HTTP url '{}'",
                        version, platform, entry.url
                    )));
                }
                if !is_sha256_hex(&entry.sha256) {
                    return Err(IndexError::InvalidMapping(format!(
                        "{}/{} has a malformed sha256 '{}'",
                        version, platform, entry.sha256
                    )));
                }
            }
        }

        let mut keys: Vec<&String> = self.versions.keys().collect();
        keys.sort_by(|a, b| compare_versions(a, b));
        if let Some(pair) = keys
            .windows(2)
            .find(|pair| compare_versions(pair[0], pair[1]) == Ordering::Equal)
        {
            return Err(IndexError::InvalidMapping(format!(
                "versions {} and {} differ only in build metadata",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize version mapping")?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a mapping without validating it.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse version mapping")
    }
}

impl Serialize for VersionMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut keys: Vec<&String> = self.versions.keys().collect();
        keys.sort_by(|a, b| compare_versions(b, a));

        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(key, &self.versions[key])?;
        }
        map.end()
    }
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
