//! Tag normalization and semantic-version ordering.
//!
//! Ordering is semantic-version precedence: build metadata is ignored, so
//! `1.0.0+a` and `1.0.0+b` are the same version.

use semver::Version;
use std::cmp::Ordering;

/// Parse the version out of a release tag named `{tag_prefix}{version}`.
///
/// Returns `None` for tags without the prefix or when what follows it is
/// not a semantic version. Asset URLs are rebuilt from the prefix and the
/// version, so only tags of that exact shape are usable.
pub fn normalize_tag(tag: &str, tag_prefix: &str) -> Option<Version> {
    let rest = tag.trim().strip_prefix(tag_prefix)?;
    Version::parse(rest).ok()
}

/// Compare two version strings by semantic-version precedence.
///
/// Strings that do not parse sort before all that do, and compare
/// lexically among themselves.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a).ok(), Version::parse(b).ok()) {
        (Some(a), Some(b)) => a.cmp_precedence(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Sort ascending by precedence and drop versions of equal precedence,
/// keeping the first one listed.
pub fn sort_ascending(versions: &mut Vec<Version>) {
    versions.sort_by(|a, b| a.cmp_precedence(b));
    versions.dedup_by(|later, earlier| later.cmp_precedence(earlier) == Ordering::Equal);
}

/// The newest `count` versions of an ascending list, still ascending.
pub fn newest(versions: &[Version], count: usize) -> &[Version] {
    let start = versions.len().saturating_sub(count);
    &versions[start..]
}
