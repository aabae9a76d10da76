//! Rebuilds the version mapping from the release index and the asset host.
//!
//! Only two things are fatal here: the release index cannot be listed, or
//! the assembled mapping fails validation. A missing or unhashable asset
//! drops that one platform; a version with no usable platform is dropped.

use anyhow::Result;
use futures_util::future::join_all;
use log::{debug, info, warn};
use semver::Version;

use crate::asset::{AssetHost, AssetNaming};
use crate::error::IndexError;
use crate::github::ListReleases;
use crate::mapping::{PlatformEntries, ReleaseEntry, VersionMapping};
use crate::platform::Platform;
use crate::version::{newest, normalize_tag, sort_ascending};

pub const DEFAULT_MAX_VERSIONS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Keep releases GitHub marks as pre-releases.
    pub include_prereleases: bool,
}

/// Where a version's archive for one platform was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocation {
    pub platform: Platform,
    pub url: String,
}

/// A (version, platform) pair left out of the mapping, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAsset {
    pub version: String,
    pub platform: Platform,
    pub reason: String,
}

/// Outcome of a rebuild: the mapping plus what was left out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub mapping: VersionMapping,
    pub dropped_versions: Vec<String>,
    pub skipped_assets: Vec<SkippedAsset>,
}

impl RebuildReport {
    pub fn summary(&self) -> String {
        format!(
            "{} version(s) written, {} dropped, {} asset(s) skipped",
            self.mapping.len(),
            self.dropped_versions.len(),
            self.skipped_assets.len()
        )
    }
}

enum PlatformOutcome {
    Found(ReleaseEntry),
    Missing,
    Skipped(String),
}

pub struct MetadataBuilder<S: ListReleases, H: AssetHost> {
    source: S,
    host: H,
    naming: AssetNaming,
    options: BuildOptions,
}

impl<S: ListReleases, H: AssetHost> MetadataBuilder<S, H> {
    pub fn new(source: S, host: H, naming: AssetNaming, options: BuildOptions) -> Self {
        Self {
            source,
            host,
            naming,
            options,
        }
    }

    /// Release versions from the index, ascending by semantic version.
    ///
    /// Drafts, tags that are not `{tag_prefix}{semver}` and (unless enabled)
    /// pre-releases are left out.
    #[tracing::instrument(skip(self))]
    pub async fn list_release_tags(&self) -> Result<Vec<Version>> {
        let releases = self.source.list_releases().await?;

        let mut versions: Vec<Version> = releases
            .iter()
            .filter(|r| !r.draft)
            .filter(|r| self.options.include_prereleases || !r.prerelease)
            .filter_map(|r| {
                let version = normalize_tag(&r.tag_name, &self.naming.tag_prefix);
                if version.is_none() {
                    debug!(
                        "Ignoring tag '{}': not '{}' followed by a semantic version",
                        r.tag_name, self.naming.tag_prefix
                    );
                }
                version
            })
            .collect();

        sort_ascending(&mut versions);
        Ok(versions)
    }

    /// Build the asset URL for `platform` and check that the host has it.
    ///
    /// `Ok(None)` when the host says the asset does not exist.
    pub async fn resolve_asset_for_platform(
        &self,
        version: &Version,
        platform: Platform,
    ) -> Result<Option<AssetLocation>> {
        let url = self.naming.url(version, platform);
        if self.host.exists(&url).await? {
            Ok(Some(AssetLocation { platform, url }))
        } else {
            debug!("No {} asset for {} at {}", platform, version, url);
            Ok(None)
        }
    }

    /// SHA-256 of the asset at `url`, as an [`IndexError::HashCompute`] on failure.
    pub async fn compute_content_hash(&self, url: &str) -> Result<String> {
        self.host.sha256(url).await.map_err(|e| {
            IndexError::HashCompute {
                url: url.to_string(),
                reason: format!("{:#}", e),
            }
            .into()
        })
    }

    async fn build_platform(&self, version: &Version, platform: Platform) -> PlatformOutcome {
        let location = match self.resolve_asset_for_platform(version, platform).await {
            Ok(Some(location)) => location,
            Ok(None) => return PlatformOutcome::Missing,
            Err(e) => return PlatformOutcome::Skipped(format!("probe failed: {:#}", e)),
        };

        match self.compute_content_hash(&location.url).await {
            Ok(sha256) => PlatformOutcome::Found(ReleaseEntry {
                url: location.url,
                sha256,
                version: version.to_string(),
            }),
            Err(e) => PlatformOutcome::Skipped(e.to_string()),
        }
    }

    /// Probe and hash every platform of `version`.
    ///
    /// Returns `None` for the entries when no platform produced one, along
    /// with the platforms that failed (missing assets are not reported).
    #[tracing::instrument(skip(self, version), fields(version = %version))]
    pub async fn build_version_entry(
        &self,
        version: &Version,
    ) -> (Option<PlatformEntries>, Vec<SkippedAsset>) {
        let outcomes = join_all(
            Platform::ALL
                .iter()
                .map(|platform| self.build_platform(version, *platform)),
        )
        .await;

        let mut entries = PlatformEntries::new();
        let mut skipped = Vec::new();

        for (platform, outcome) in Platform::ALL.iter().zip(outcomes) {
            match outcome {
                PlatformOutcome::Found(entry) => {
                    entries.insert(*platform, entry);
                }
                PlatformOutcome::Missing => {}
                PlatformOutcome::Skipped(reason) => {
                    warn!("Skipping {} for {}: {}", platform, version, reason);
                    skipped.push(SkippedAsset {
                        version: version.to_string(),
                        platform: *platform,
                        reason,
                    });
                }
            }
        }

        if entries.is_empty() {
            (None, skipped)
        } else {
            (Some(entries), skipped)
        }
    }

    /// Rebuild the mapping from the newest `max_versions` releases.
    ///
    /// The result has already passed [`VersionMapping::validate`].
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_mapping(&self, max_versions: usize) -> Result<RebuildReport> {
        let versions = self.list_release_tags().await?;
        let selected = newest(&versions, max_versions);

        info!(
            "Processing {} of {} release(s)",
            selected.len(),
            versions.len()
        );

        let mut report = RebuildReport::default();

        for version in selected {
            info!("Processing {}...", version);
            let (entries, skipped) = self.build_version_entry(version).await;
            report.skipped_assets.extend(skipped);

            match entries {
                Some(entries) => report.mapping.insert(version.to_string(), entries),
                None => {
                    warn!("No platform assets available for {}, dropping it", version);
                    report.dropped_versions.push(version.to_string());
                }
            }
        }

        if report.mapping.is_empty() {
            return Err(IndexError::InvalidMapping(
                "no release produced a usable platform asset".to_string(),
            )
            .into());
        }
        report.mapping.validate()?;
        Ok(report)
    }
}
