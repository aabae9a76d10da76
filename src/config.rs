//! Resolved settings and the network clients built from them.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::time::Duration;

use crate::{
    asset::{AssetNaming, DEFAULT_ASSET_STEM, DEFAULT_DOWNLOAD_URL, DEFAULT_TAG_PREFIX},
    github::{GitHub, GitHubRepo},
    http::{HttpClient, RetryPolicy},
    runtime::Runtime,
    store::DEFAULT_OUTPUT,
};

pub const DEFAULT_REPO: &str = "oven-sh/bun";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("release-pins/", env!("RELEASE_PINS_VERSION"));

/// What to query and where to write, before any client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repo: GitHubRepo,
    pub api_url: Option<String>,
    pub download_url: String,
    pub tag_prefix: String,
    pub asset_stem: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.parse().expect("DEFAULT_REPO is in owner/repo form"),
            api_url: None,
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            asset_stem: DEFAULT_ASSET_STEM.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

pub struct Config {
    pub http: HttpClient,
    pub github: GitHub,
    pub naming: AssetNaming,
    pub output: PathBuf,
}

impl Config {
    pub fn new<R: Runtime>(runtime: &R, settings: Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN")
            && !token.is_empty()
        {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GITHUB_TOKEN contains characters not allowed in a header")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication: {}", redact(&token));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let http = HttpClient::new(client).with_policy(settings.retry);
        let github = GitHub::new(http.clone(), settings.api_url, settings.repo.clone());
        let naming = AssetNaming {
            download_base: settings.download_url,
            repo: settings.repo,
            tag_prefix: settings.tag_prefix,
            asset_stem: settings.asset_stem,
        };

        Ok(Self {
            http,
            github,
            naming,
            output: settings.output,
        })
    }
}

fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
