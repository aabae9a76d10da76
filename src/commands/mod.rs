use anyhow::{Result, bail};

use crate::platform::Platform;

mod resolve;
mod update;

pub use resolve::{latest, list};
pub use update::update;

/// The requested platform, or the host's when none was given.
pub fn resolve_platform(platform: Option<Platform>) -> Result<Platform> {
    match platform.or_else(Platform::detect) {
        Some(platform) => Ok(platform),
        None => bail!(
            "Unsupported host platform, pass --platform explicitly (one of: {})",
            Platform::ALL.map(Platform::id).join(", ")
        ),
    }
}
