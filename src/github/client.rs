use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::repo::GitHubRepo;
use super::types::Release;
use crate::error::IndexError;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Releases are requested this many per page.
const PER_PAGE: usize = 100;

/// Hard stop for pagination (1000 releases).
const MAX_PAGES: usize = 10;

/// Source of the release list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListReleases: Send + Sync {
    /// Every release of the repository, in the order the index returns them.
    ///
    /// Fails with [`IndexError::Network`] or [`IndexError::Parse`].
    async fn list_releases(&self) -> Result<Vec<Release>>;
}

pub struct GitHub {
    http: HttpClient,
    api_url: String,
    repo: GitHubRepo,
}

impl GitHub {
    pub fn new(http: HttpClient, api_url: Option<String>, repo: GitHubRepo) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            http,
            api_url,
            repo,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.api_url, self.repo.owner, self.repo.repo
        )
    }

    async fn fetch_page(&self, url: &str, page: usize) -> Result<Vec<Release>> {
        let page_str = page.to_string();
        let per_page = PER_PAGE.to_string();

        debug!("Fetching releases page {} from {}...", page, url);

        let body = self
            .http
            .get_text_with_query(
                url,
                &[("per_page", per_page.as_str()), ("page", page_str.as_str())],
            )
            .await
            .map_err(|e| IndexError::Network {
                url: url.to_string(),
                reason: format!("{:#}", e),
            })?;

        let parsed = serde_json::from_str::<Vec<Release>>(&body).map_err(|e| IndexError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(parsed)
    }
}

#[async_trait]
impl ListReleases for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self) -> Result<Vec<Release>> {
        let url = self.releases_url();
        let mut releases = Vec::new();

        for page in 1..=MAX_PAGES {
            let parsed = self.fetch_page(&url, page).await?;
            let len = parsed.len();
            releases.extend(parsed);

            if len < PER_PAGE {
                break;
            }
        }

        debug!("Found {} releases for {}", releases.len(), self.repo);
        Ok(releases)
    }
}
