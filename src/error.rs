//! Error kinds raised while rebuilding the release mapping.
//!
//! These travel inside `anyhow::Error` and are recovered with
//! `downcast_ref` where a caller needs to tell them apart.

use thiserror::Error;

use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The release index could not be reached.
    #[error("release index unreachable at {url}: {reason}")]
    Network { url: String, reason: String },

    /// The release index answered with something that is not a release list.
    #[error("malformed response from release index at {url}: {reason}")]
    Parse { url: String, reason: String },

    /// Downloading or hashing a single asset failed.
    #[error("failed to hash {url}: {reason}")]
    HashCompute { url: String, reason: String },

    /// The assembled mapping violates a structural invariant.
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
}

/// Lookup failures from the resolver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no release available for platform {0}")]
    NoReleaseForPlatform(Platform),
}
