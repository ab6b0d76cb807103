use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::{data_dir, write_atomic};

/// Cache version. Bump to abandon every previously cached asset.
pub const CACHE_NAME: &str = "dw-helper-v3";

/// Offline copy of fetched assets, one file per asset.
#[derive(Debug, Clone)]
pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    /// Cache rooted at `root`, scoped to the current `CACHE_NAME`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            dir: root.into().join(CACHE_NAME),
        }
    }

    /// Cache under the data directory (~/.dwhelper/cache/).
    pub fn in_data_dir() -> Self {
        Self::new(data_dir().join("cache"))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    /// Store an asset. Failures only cost the offline copy, so they are logged.
    pub fn put(&self, key: &str, body: &str) {
        if let Err(e) = write_atomic(&self.dir.join(key), body) {
            warn!(key, dir = %self.dir.display(), error = %e, "could not cache asset");
        }
    }
}
