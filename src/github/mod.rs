//! GitHub releases API: the release index the mapping is built from.

mod client;
mod repo;
mod types;

pub use client::{DEFAULT_API_URL, GitHub, ListReleases};
pub use repo::GitHubRepo;
pub use types::Release;

#[cfg(test)]
pub use client::MockListReleases;
