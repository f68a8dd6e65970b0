//! Memoizing file cache for provider tables
//!
//! Provides a `FileCache` that persists fetched tables to disk and serves
//! repeated lookups without touching the network. Each entry is identified by
//! a key string derived from the fetch arguments and stored at
//! `cache_dir/<key>.feather`; entries left behind in the legacy
//! `cache_dir/<key>.json` shape are rewritten as feather the first time they
//! are read.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::debug;

use crate::table::{self, TableError, FEATHER_EXT, LEGACY_EXT};

/// Errors raised by cache lookups and writes
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be created
    #[error("failed to create cache directory: {0}")]
    CreateDir(#[from] std::io::Error),

    /// A cached table could not be read or written
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Memoize-to-disk cache for tables keyed by fetch arguments
///
/// Lookups prefer the primary feather format; a legacy JSON entry is upgraded
/// to feather as a side effect of reading it. There is no expiry and no
/// locking: stale entries are managed by deleting files out of band, and
/// concurrent writers of the same key race with last-writer-wins.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileCache {
    /// Creates a cache rooted at the given directory.
    ///
    /// The directory itself is created lazily, on each lookup.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the directory this cache stores entries under
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of a cache entry for the given key and suffix
    fn entry_path(&self, key: &str, ext: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, ext))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Returns the cached table for `key`, computing and persisting it on a
    /// miss.
    ///
    /// Resolution order:
    /// 1. A feather entry exists: deserialize and return it.
    /// 2. A legacy JSON entry exists: deserialize it, rewrite it as feather,
    ///    and return it.
    /// 3. Otherwise invoke `compute`, persist its result as feather, and
    ///    return it.
    ///
    /// Errors from deserialization, `compute`, or persistence propagate
    /// unmodified; a corrupt entry is not repaired or bypassed.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<DataFrame, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DataFrame, E>>,
        E: From<CacheError>,
    {
        self.ensure_dir().map_err(CacheError::from)?;

        let feather_path = self.entry_path(key, FEATHER_EXT);
        if feather_path.exists() {
            debug!(key, "cache hit");
            return table::read_feather(&feather_path)
                .map_err(CacheError::from)
                .map_err(E::from);
        }

        let legacy_path = self.entry_path(key, LEGACY_EXT);
        if legacy_path.exists() {
            debug!(key, "upgrading legacy cache entry");
            let mut df = table::read_legacy_json(&legacy_path).map_err(CacheError::from)?;
            table::write_feather(&mut df, &feather_path).map_err(CacheError::from)?;
            return Ok(df);
        }

        debug!(key, "cache miss");
        let mut df = compute().await?;
        table::write_feather(&mut df, &feather_path).map_err(CacheError::from)?;
        Ok(df)
    }
}
