use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    mapping::ReleaseEntry, platform::Platform, resolver, runtime::Runtime, store::MappingStore,
};

/// Print the newest entry available for `platform` as JSON.
#[tracing::instrument(skip(runtime))]
pub fn latest<R: Runtime>(runtime: &R, output: &Path, platform: Platform) -> Result<ReleaseEntry> {
    let mapping = MappingStore::new(runtime, output).load_required()?;
    let entry = resolver::latest(&mapping, platform)?.clone();

    debug!("Latest {} release is {}", platform, entry.version);
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(entry)
}

/// Print every version available for `platform`, newest first.
#[tracing::instrument(skip(runtime))]
pub fn list<R: Runtime>(
    runtime: &R,
    output: &Path,
    platform: Platform,
) -> Result<Vec<ReleaseEntry>> {
    let mapping = MappingStore::new(runtime, output).load_required()?;
    let entries: Vec<ReleaseEntry> = resolver::newest_first(&mapping, platform)
        .into_iter()
        .cloned()
        .collect();

    if entries.is_empty() {
        println!("No releases for {}.", platform);
        return Ok(entries);
    }

    for entry in &entries {
        println!("{} {}", entry.version, entry.url);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    const SOURCES: &str = r#"{
  "2.4.1": {
    "linux-x64": {
      "url": "https://github.com/oven-sh/bun/releases/download/bun-v2.4.1/bun-linux-x64.zip",
      "sha256": "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447",
      "version": "2.4.1"
    }
  },
  "2.4.0": {
    "linux-x64": {
      "url": "https://github.com/oven-sh/bun/releases/download/bun-v2.4.0/bun-linux-x64.zip",
      "sha256": "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447",
      "version": "2.4.0"
    },
    "windows-x64": {
      "url": "https://github.com/oven-sh/bun/releases/download/bun-v2.4.0/bun-windows-x64.zip",
      "sha256": "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447",
      "version": "2.4.0"
    }
  },
  "2.1.0": {
    "linux-x64": {
      "url": "https://github.com/oven-sh/bun/releases/download/bun-v2.1.0/bun-linux-x64.zip",
      "sha256": "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447",
      "version": "2.1.0"
    }
  }
}
"#;

    #[test]
    fn test_latest_from_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("sources.json");
        fs::write(&output, SOURCES).unwrap();

        let entry = latest(&RealRuntime, &output, Platform::LinuxX64).unwrap();
        assert_eq!(entry.version, "2.4.1");

        let entry = latest(&RealRuntime, &output, Platform::WindowsX64).unwrap();
        assert_eq!(entry.version, "2.4.0");
    }

    #[test]
    fn test_latest_no_release_for_platform() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("sources.json");
        fs::write(&output, SOURCES).unwrap();

        let err = latest(&RealRuntime, &output, Platform::MacosArm64).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResolveError>(),
            Some(&ResolveError::NoReleaseForPlatform(Platform::MacosArm64))
        );
    }

    #[test]
    fn test_latest_missing_file() {
        let dir = tempdir().unwrap();
        let err = latest(&RealRuntime, &dir.path().join("sources.json"), Platform::LinuxX64)
            .unwrap_err();
        assert!(err.to_string().contains("release-pins update"));
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("sources.json");
        fs::write(&output, SOURCES).unwrap();

        let versions: Vec<String> = list(&RealRuntime, &output, Platform::LinuxX64)
            .unwrap()
            .into_iter()
            .map(|e| e.version)
            .collect();
        assert_eq!(versions, vec!["2.4.1", "2.4.0", "2.1.0"]);

        assert!(list(&RealRuntime, &output, Platform::MacosX64).unwrap().is_empty());
    }
}
