use semver::Version;

use crate::github::GitHubRepo;
use crate::platform::Platform;

pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com";
pub const DEFAULT_TAG_PREFIX: &str = "bun-v";
pub const DEFAULT_ASSET_STEM: &str = "bun";

/// How the release host names a version's per-platform archives.
///
/// `{download_base}/{owner}/{repo}/releases/download/{tag_prefix}{version}/{asset_stem}-{target}.zip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNaming {
    pub download_base: String,
    pub repo: GitHubRepo,
    pub tag_prefix: String,
    pub asset_stem: String,
}

impl AssetNaming {
    pub fn new(repo: GitHubRepo) -> Self {
        Self {
            download_base: DEFAULT_DOWNLOAD_URL.to_string(),
            repo,
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            asset_stem: DEFAULT_ASSET_STEM.to_string(),
        }
    }

    pub fn tag(&self, version: &Version) -> String {
        format!("{}{}", self.tag_prefix, version)
    }

    pub fn file_name(&self, platform: Platform) -> String {
        format!("{}-{}.zip", self.asset_stem, platform.asset_target())
    }

    pub fn url(&self, version: &Version, platform: Platform) -> String {
        format!(
            "{}/{}/{}/releases/download/{}/{}",
            self.download_base.trim_end_matches('/'),
            self.repo.owner,
            self.repo.repo,
            self.tag(version),
            self.file_name(platform)
        )
    }
}
