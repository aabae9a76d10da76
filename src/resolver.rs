//! Version resolution over a loaded mapping.
//!
//! Pure functions: the mapping is only ever borrowed.

use std::collections::BTreeMap;

use crate::error::ResolveError;
use crate::mapping::{ReleaseEntry, VersionMapping};
use crate::platform::Platform;
use crate::version::compare_versions;

/// Versions that carry an entry for `platform`, keyed by version.
pub fn available_for(
    mapping: &VersionMapping,
    platform: Platform,
) -> BTreeMap<&str, &ReleaseEntry> {
    mapping
        .iter()
        .filter_map(|(version, entries)| entries.get(&platform).map(|entry| (version, entry)))
        .collect()
}

/// The entry with the greatest semantic version available for `platform`.
pub fn latest(mapping: &VersionMapping, platform: Platform) -> Result<&ReleaseEntry, ResolveError> {
    available_for(mapping, platform)
        .into_iter()
        .max_by(|(a, _), (b, _)| compare_versions(a, b))
        .map(|(_, entry)| entry)
        .ok_or(ResolveError::NoReleaseForPlatform(platform))
}

/// Available entries for `platform`, newest first.
pub fn newest_first(mapping: &VersionMapping, platform: Platform) -> Vec<&ReleaseEntry> {
    let mut entries: Vec<&ReleaseEntry> = available_for(mapping, platform).into_values().collect();
    entries.sort_by(|a, b| compare_versions(&b.version, &a.version));
    entries
}
