//! Process-lifetime table cache
//!
//! Every picker change recomputes the pivot, but the statistics file only
//! needs parsing once. Entries are keyed by path and reloaded when the file's
//! modification time moves.

use super::{load_table, StatTable};
use crate::buckets::AgeScale;
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

struct CachedTable {
    modified: Option<SystemTime>,
    table: Arc<StatTable>,
}

#[derive(Default)]
pub struct TableCache {
    entries: Mutex<HashMap<PathBuf, CachedTable>>,
    bucket_check: Option<AgeScale>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that warns about unknown bucket labels every time a file is
    /// (re)loaded.
    pub fn with_bucket_check(scale: AgeScale) -> Self {
        Self {
            bucket_check: Some(scale),
            ..Self::default()
        }
    }

    /// Return the cached table for `path`, loading it on first use or after
    /// the file changed. Load errors are returned and never cached.
    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<StatTable>> {
        let path = path.as_ref();
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = entries.get(path) {
            if cached.modified == modified {
                log::debug!("Cache hit: {}", path.display());
                return Ok(Arc::clone(&cached.table));
            }
            log::debug!("Source changed, reloading: {}", path.display());
        }

        let table = Arc::new(load_table(path)?);
        if let Some(scale) = self.bucket_check {
            table.warn_unknown_buckets(scale);
        }
        entries.insert(
            path.to_path_buf(),
            CachedTable {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
