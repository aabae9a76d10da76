//! Release assets: where they live and how they are probed and hashed.

mod naming;

use anyhow::Result;
use async_trait::async_trait;

use crate::http::HttpClient;

pub use naming::{AssetNaming, DEFAULT_ASSET_STEM, DEFAULT_DOWNLOAD_URL, DEFAULT_TAG_PREFIX};

/// Host serving the release archives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// `Ok(false)` when the host reports the asset does not exist.
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Lowercase hex SHA-256 of the asset body.
    async fn sha256(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl AssetHost for HttpClient {
    async fn exists(&self, url: &str) -> Result<bool> {
        HttpClient::exists(self, url).await
    }

    async fn sha256(&self, url: &str) -> Result<String> {
        HttpClient::sha256(self, url).await
    }
}
