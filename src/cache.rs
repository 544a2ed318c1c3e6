//! Placeholder cache for incremental fetches.
//!
//! The search is one request, but placeholders are one request per image, so
//! a 400-photo gallery costs 400 round trips on every build. This module lets
//! the fetch stage skip placeholders whose asset and request parameters
//! haven't changed since the last build.
//!
//! # Design
//!
//! The cache is **content-addressed**: an entry's key is a SHA-256 over
//! everything that determines the placeholder bytes:
//!
//! - cloud name and public id (which asset)
//! - format, version, width and height (which revision of the asset)
//! - placeholder width and quality (which rendition)
//!
//! Replacing an asset upstream bumps its version, so the key changes and the
//! placeholder is fetched again. Reordering the catalog changes nothing: ids
//! are not part of the key.
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<temp_dir>/.placeholder-cache.json`,
//! next to the catalog manifest.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `fetch` or `build` to start from an empty cache. The
//! file is still rewritten afterwards with the fresh results.

use crate::media::PlaceholderParams;
use crate::types::RawAsset;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the temp directory.
const MANIFEST_FILENAME: &str = ".placeholder-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A cached placeholder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Kept for inspection; lookups go by key only.
    pub public_id: String,
    pub data_url: String,
}

/// On-disk cache manifest mapping content keys to placeholders.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderCache {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl PlaceholderCache {
    /// Create an empty cache (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the temp directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable placeholder cache");
                return Self::empty();
            }
        };
        if cache.version != MANIFEST_VERSION {
            return Self::empty();
        }
        cache
    }

    /// Save to the temp directory.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(dir), json)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.data_url.as_str())
    }

    pub fn insert(&mut self, key: String, public_id: String, data_url: String) {
        self.entries.insert(
            key,
            CacheEntry {
                public_id,
                data_url,
            },
        );
    }

    /// Drop entries whose key is not in `live`, so assets removed upstream
    /// don't accumulate.
    pub fn retain_keys(&mut self, live: &std::collections::HashSet<String>) {
        self.entries.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SHA-256 content key for one asset's placeholder.
pub fn placeholder_key(cloud_name: &str, asset: &RawAsset, params: PlaceholderParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"placeholder\0");
    for field in [
        cloud_name.as_bytes(),
        asset.public_id.as_bytes(),
        asset.format.as_bytes(),
    ] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    hasher.update(asset.version.unwrap_or(0).to_le_bytes());
    hasher.update(asset.width.to_le_bytes());
    hasher.update(asset.height.to_le_bytes());
    hasher.update(params.width.to_le_bytes());
    hasher.update(params.quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a fetch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} fetched ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} fetched", self.misses)
        }
    }
}

/// Resolve the cache manifest path for a temp directory.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILENAME)
}
