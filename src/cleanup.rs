use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Tracks staged files that must not outlive an interrupted run.
#[derive(Default)]
pub struct CleanupContext {
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Forget a path once the operation owning it finished.
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every registered file. Errors are ignored.
    pub fn cleanup(&self) {
        for path in &self.paths {
            debug!("Cleaning up: {:?}", path);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Register `path` on a shared context. A poisoned lock is ignored.
pub fn register(ctx: &SharedCleanupContext, path: &Path) {
    if let Ok(mut guard) = ctx.lock() {
        guard.add(path.to_path_buf());
    }
}

/// Unregister `path` from a shared context.
pub fn unregister(ctx: &SharedCleanupContext, path: &Path) {
    if let Ok(mut guard) = ctx.lock() {
        guard.remove(path);
    }
}

/// Remove every file registered on a shared context, e.g. from a Ctrl-C handler.
pub fn run(ctx: &SharedCleanupContext) {
    if let Ok(guard) = ctx.lock() {
        guard.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_context_add_remove() {
        let mut ctx = CleanupContext::new();
        let path = PathBuf::from("/tmp/sources.json.tmp");

        ctx.add(path.clone());
        assert_eq!(ctx.paths().len(), 1);

        ctx.remove(&path);
        assert!(ctx.paths().is_empty());
    }

    #[test]
    fn test_cleanup_removes_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("sources.json.tmp");
        fs::write(&file_path, "{}").unwrap();

        let mut ctx = CleanupContext::new();
        ctx.add(file_path.clone());
        ctx.cleanup();

        assert!(!file_path.exists());
    }

    #[test]
    fn test_cleanup_ignores_missing_files() {
        let mut ctx = CleanupContext::new();
        ctx.add(PathBuf::from("/nonexistent/sources.json.tmp"));
        ctx.cleanup();
    }

    #[test]
    fn test_shared_register_and_run() {
        let dir = tempdir().unwrap();
        let kept = dir.path().join("kept");
        let staged = dir.path().join("staged");
        fs::write(&kept, "a").unwrap();
        fs::write(&staged, "b").unwrap();

        let ctx = new_shared();
        register(&ctx, &kept);
        register(&ctx, &staged);
        unregister(&ctx, &kept);
        run(&ctx);

        assert!(kept.exists());
        assert!(!staged.exists());
    }
}
