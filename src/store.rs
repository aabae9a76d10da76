//! Persistence of the version mapping.
//!
//! A commit never modifies the persisted file in place. The new mapping is
//! staged next to it as `<file>.tmp`, read back and validated, and only then
//! renamed over the original. Any failure before the rename discards the
//! staged file and leaves the original byte-for-byte intact. The previous
//! generation is kept as `<file>.bak`, and `<file>.lock` keeps two runs from
//! committing at the same time.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::cleanup::{self, SharedCleanupContext};
use crate::error::IndexError;
use crate::mapping::VersionMapping;
use crate::runtime::Runtime;

pub const DEFAULT_OUTPUT: &str = "sources.json";

pub struct MappingStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> MappingStore<'a, R> {
    pub fn new(runtime: &'a R, path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn staging_path(&self) -> PathBuf {
        sibling(&self.path, ".tmp")
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, ".bak")
    }

    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Load and validate the persisted mapping, `None` if there is none yet.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<Option<VersionMapping>> {
        if !self.runtime.exists(&self.path) {
            return Ok(None);
        }

        let content = self.runtime.read_to_string(&self.path)?;
        let mapping = VersionMapping::from_json(&content)
            .with_context(|| format!("Failed to load mapping from {:?}", self.path))?;
        mapping.validate()?;
        Ok(Some(mapping))
    }

    /// Load the persisted mapping, failing if it does not exist.
    pub fn load_required(&self) -> Result<VersionMapping> {
        self.load()?.ok_or_else(|| {
            anyhow!(
                "No mapping at {:?}. Run `release-pins update` first.",
                self.path
            )
        })
    }

    /// Atomically replace the persisted mapping with `mapping`.
    ///
    /// The staged file is registered on `cleanup_ctx` while it exists.
    #[tracing::instrument(skip(self, mapping, cleanup_ctx))]
    pub fn commit(
        &self,
        mapping: &VersionMapping,
        cleanup_ctx: &SharedCleanupContext,
    ) -> Result<()> {
        mapping.validate()?;
        let content = mapping.to_json_pretty()?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let _lock = FileLock::acquire(self.runtime, self.lock_path(), cleanup_ctx)?;

        let staging = self.staging_path();
        cleanup::register(cleanup_ctx, &staging);

        let result = self.stage_and_swap(&staging, mapping, content.as_bytes());
        if result.is_err() && self.runtime.exists(&staging) {
            debug!("Discarding staged mapping {:?}", staging);
            if let Err(e) = self.runtime.remove_file(&staging) {
                warn!("Failed to remove staged mapping {:?}: {}", staging, e);
            }
        }
        cleanup::unregister(cleanup_ctx, &staging);

        result?;
        info!("Wrote {} version(s) to {:?}", mapping.len(), self.path);
        Ok(())
    }

    fn stage_and_swap(
        &self,
        staging: &Path,
        mapping: &VersionMapping,
        content: &[u8],
    ) -> Result<()> {
        self.runtime
            .write(staging, content)
            .with_context(|| format!("Failed to stage mapping at {:?}", staging))?;

        let staged = self.runtime.read_to_string(staging)?;
        let reparsed = VersionMapping::from_json(&staged)
            .map_err(|e| IndexError::InvalidMapping(format!("staged file unreadable: {:#}", e)))?;
        reparsed.validate()?;
        if reparsed != *mapping {
            return Err(IndexError::InvalidMapping(
                "staged file does not match the assembled mapping".to_string(),
            )
            .into());
        }

        if self.runtime.exists(&self.path) {
            let backup = self.backup_path();
            self.runtime.copy(&self.path, &backup)?;
            debug!("Previous mapping kept at {:?}", backup);
        }

        self.runtime.rename(staging, &self.path)
    }
}

/// Exclusive lock file, removed on drop.
struct FileLock<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    cleanup_ctx: SharedCleanupContext,
}

impl<'a, R: Runtime> FileLock<'a, R> {
    fn acquire(runtime: &'a R, path: PathBuf, cleanup_ctx: &SharedCleanupContext) -> Result<Self> {
        let pid = std::process::id().to_string();
        if let Err(e) = runtime.create_new(&path, pid.as_bytes()) {
            let holder = runtime
                .read_to_string(&path)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let message = match holder {
                Some(holder) => format!(
                    "Another run (pid {}) appears to hold {:?}. \
                     Remove it if that process is no longer running.",
                    holder, path
                ),
                None => format!(
                    "Another run appears to hold {:?}. Remove it if no other run is active.",
                    path
                ),
            };
            return Err(e.context(message));
        }
        cleanup::register(cleanup_ctx, &path);
        Ok(Self {
            runtime,
            path,
            cleanup_ctx: SharedCleanupContext::clone(cleanup_ctx),
        })
    }
}

impl<R: Runtime> Drop for FileLock<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.runtime.remove_file(&self.path) {
            warn!("Failed to release lock {:?}: {}", self.path, e);
        }
        cleanup::unregister(&self.cleanup_ctx, &self.path);
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from(DEFAULT_OUTPUT));
    name.push(suffix);
    path.with_file_name(name)
}
