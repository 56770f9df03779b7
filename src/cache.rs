//! Cache for the analytic table.
//!
//! The table is built once per source file and read-only afterwards. The
//! cache owns the table, takes the loader as an injected function, and
//! reloads only when the source file's fingerprint changes or when
//! `invalidate` is called.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use polars::prelude::DataFrame;

use crate::error::ComexError;

pub type Loader = Box<dyn Fn(&Path) -> Result<DataFrame, ComexError> + Send + Sync>;

/// Identity of a source file at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceFingerprint {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl SourceFingerprint {
    fn of(path: &Path) -> Result<Self, ComexError> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

pub struct TableCache {
    loader: Loader,
    cached: Option<(SourceFingerprint, DataFrame)>,
}

impl TableCache {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            cached: None,
        }
    }

    /// The cached table, if any, without touching the filesystem.
    pub fn get(&self) -> Option<&DataFrame> {
        self.cached.as_ref().map(|(_, df)| df)
    }

    /// Load the table for `path`, reusing the cached one while the file's
    /// fingerprint (path, length, mtime) is unchanged.
    pub fn get_or_load(&mut self, path: &Path) -> Result<&DataFrame, ComexError> {
        let fingerprint = SourceFingerprint::of(path)?;
        let stale = match &self.cached {
            Some((cached, _)) => *cached != fingerprint,
            None => true,
        };
        if stale {
            let df = (self.loader)(path)?;
            self.cached = Some((fingerprint, df));
        }
        Ok(&self.cached.as_ref().unwrap().1)
    }

    /// Manual invalidation hook; the next access reloads.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_loader(counter: Arc<AtomicUsize>) -> Loader {
        Box::new(move |_path| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DataFrame::new(vec![Column::new("x".into(), &[1i32, 2])]).unwrap())
        })
    }

    fn temp_source(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "comex-cache-test-{}-{}.csv",
            tag,
            std::process::id()
        ));
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        path
    }

    #[test]
    fn repeated_access_loads_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut cache = TableCache::new(counting_loader(counter.clone()));
        let path = temp_source("hit");

        cache.get_or_load(&path).unwrap();
        cache.get_or_load(&path).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(cache.get().is_some());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalidate_forces_a_reload() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut cache = TableCache::new(counting_loader(counter.clone()));
        let path = temp_source("invalidate");

        cache.get_or_load(&path).unwrap();
        cache.invalidate();
        assert!(cache.get().is_none());
        cache.get_or_load(&path).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        std::fs::remove_file(&path).ok();
    }
}
