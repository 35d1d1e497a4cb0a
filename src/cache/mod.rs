//! File hash caching for incremental checks
//!
//! CDD Principle: Infrastructure Layer - the cache is a performance concern
//! - FileCache acts as a repository for file metadata and lint results
//! - Hash-based validation keeps the cache coherent with minimal overhead
//! - A catalog fingerprint ties entries to the rule set that produced them

use crate::domain::findings::{LintError, LintResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const CACHE_VERSION: u32 = 1;

/// Cache for storing lint results and file metadata between runs
#[derive(Debug)]
pub struct FileCache {
    /// Path to the cache file
    cache_path: PathBuf,
    /// In-memory cache data
    data: CacheData,
    /// Whether the cache has been modified
    dirty: bool,
}

/// Serializable cache data structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheData {
    /// Cache format version for migration support
    version: u32,
    /// Catalog fingerprint when the cache was created
    catalog_fingerprint: Option<String>,
    /// Cached file entries
    files: HashMap<PathBuf, FileEntry>,
    /// Cache metadata
    metadata: CacheMetadata,
}

/// Metadata about the cache itself
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheMetadata {
    /// When the cache was created
    created_at: u64,
    /// When the cache was last updated
    updated_at: u64,
    /// Number of cache hits since creation
    hits: u64,
    /// Number of cache misses since creation
    misses: u64,
}

/// Cached information about a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// SHA-256 hash of file content
    pub content_hash: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified_at: u64,
    /// Number of violations found in this file
    pub violation_count: usize,
    /// When this file was last linted
    pub checked_at: u64,
    /// Catalog fingerprint when the lint was done
    pub catalog_fingerprint: String,
}

impl FileCache {
    /// Create a new file cache with the given cache file path
    pub fn new<P: AsRef<Path>>(cache_path: P) -> Self {
        Self { cache_path: cache_path.as_ref().to_path_buf(), data: CacheData::default(), dirty: false }
    }

    /// Load cache from disk, creating it if it doesn't exist
    pub fn load(&mut self) -> LintResult<()> {
        if self.cache_path.exists() {
            let content = fs::read_to_string(&self.cache_path)
                .map_err(|e| LintError::cache(format!("Failed to read cache file: {e}")))?;

            self.data = serde_json::from_str(&content)
                .map_err(|e| LintError::cache(format!("Failed to parse cache file: {e}")))?;

            if self.data.version != CACHE_VERSION {
                // Unknown format: start over rather than guessing at migration
                tracing::warn!(
                    "Cache version {} is unsupported, resetting cache",
                    self.data.version
                );
                self.reset();
            }
        } else {
            self.reset();
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.data = CacheData {
            version: CACHE_VERSION,
            catalog_fingerprint: None,
            files: HashMap::new(),
            metadata: CacheMetadata {
                created_at: current_timestamp(),
                updated_at: current_timestamp(),
                hits: 0,
                misses: 0,
            },
        };
        self.dirty = true;
    }

    /// Save cache to disk if it has been modified
    pub fn save(&mut self) -> LintResult<()> {
        if !self.dirty {
            return Ok(());
        }

        self.data.metadata.updated_at = current_timestamp();

        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LintError::cache(format!("Failed to create cache directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(&self.data)
            .map_err(|e| LintError::cache(format!("Failed to serialize cache: {e}")))?;

        fs::write(&self.cache_path, content)
            .map_err(|e| LintError::cache(format!("Failed to write cache file: {e}")))?;

        self.dirty = false;
        Ok(())
    }

    /// Record the catalog fingerprint the cache should validate against
    pub fn set_catalog_fingerprint(&mut self, fingerprint: impl Into<String>) {
        let fingerprint = fingerprint.into();
        if self.data.catalog_fingerprint.as_deref() != Some(fingerprint.as_str()) {
            // A new catalog invalidates every entry
            self.data.files.clear();
            self.data.catalog_fingerprint = Some(fingerprint);
            self.dirty = true;
        }
    }

    /// Check if a file needs to be re-linted
    pub fn needs_analysis<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        catalog_fingerprint: &str,
    ) -> LintResult<bool> {
        let file_path = file_path.as_ref();

        let metadata = fs::metadata(file_path).map_err(|e| {
            LintError::cache(format!(
                "Failed to get file metadata for {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let size = metadata.len();
        let modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let Some(entry) = self.data.files.get(file_path) else {
            self.data.metadata.misses += 1;
            self.dirty = true;
            return Ok(true);
        };

        if entry.catalog_fingerprint != catalog_fingerprint {
            self.data.metadata.misses += 1;
            self.dirty = true;
            return Ok(true);
        }

        // Fast path: unchanged size and mtime mean an unchanged file
        if entry.size == size && entry.modified_at == modified_at {
            self.data.metadata.hits += 1;
            self.dirty = true;
            return Ok(false);
        }

        // Slow path: mtime changed, compare content hashes
        let content_hash = hash_file(file_path)?;
        if entry.content_hash == content_hash {
            self.data.metadata.hits += 1;
            self.dirty = true;
            return Ok(false);
        }

        self.data.metadata.misses += 1;
        self.dirty = true;
        Ok(true)
    }

    /// Record the lint result for a file
    pub fn update_entry<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        violation_count: usize,
        catalog_fingerprint: &str,
    ) -> LintResult<()> {
        let file_path = file_path.as_ref();

        let metadata = fs::metadata(file_path).map_err(|e| {
            LintError::cache(format!(
                "Failed to get file metadata for {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let entry = FileEntry {
            content_hash: hash_file(file_path)?,
            size: metadata.len(),
            modified_at,
            violation_count,
            checked_at: current_timestamp(),
            catalog_fingerprint: catalog_fingerprint.to_string(),
        };

        self.data.files.insert(file_path.to_path_buf(), entry);
        self.dirty = true;
        Ok(())
    }

    /// Get the cached entry for a file, if any
    pub fn entry<P: AsRef<Path>>(&self, file_path: P) -> Option<&FileEntry> {
        self.data.files.get(file_path.as_ref())
    }

    /// Remove all cache entries and delete the cache file
    pub fn clear(&mut self) -> LintResult<()> {
        self.data.files.clear();
        self.data.metadata.hits = 0;
        self.data.metadata.misses = 0;
        self.dirty = true;

        if self.cache_path.exists() {
            fs::remove_file(&self.cache_path)
                .map_err(|e| LintError::cache(format!("Failed to remove cache file: {e}")))?;
        }

        Ok(())
    }

    /// Remove entries for files that no longer exist, returning the count
    pub fn cleanup(&mut self) -> LintResult<usize> {
        let stale: Vec<PathBuf> = self
            .data
            .files
            .keys()
            .filter(|path| !path.exists())
            .cloned()
            .collect();

        for path in &stale {
            self.data.files.remove(path);
        }

        if !stale.is_empty() {
            self.dirty = true;
        }

        Ok(stale.len())
    }

    /// Get statistics about this cache
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            entries: self.data.files.len(),
            hits: self.data.metadata.hits,
            misses: self.data.metadata.misses,
            created_at: self.data.metadata.created_at,
            updated_at: self.data.metadata.updated_at,
        }
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    /// Number of cached file entries
    pub entries: usize,
    /// Cache hits since creation
    pub hits: u64,
    /// Cache misses since creation
    pub misses: u64,
    /// When the cache was created
    pub created_at: u64,
    /// When the cache was last updated
    pub updated_at: u64,
}

impl CacheStatistics {
    /// Hit rate as a fraction in [0, 1]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Format statistics for display
    pub fn format_display(&self) -> String {
        format!(
            "{} entries, {} hits, {} misses ({:.0}% hit rate)",
            self.entries,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )
    }
}

fn hash_file(path: &Path) -> LintResult<String> {
    let content = fs::read(path)
        .map_err(|e| LintError::cache(format!("Failed to read {}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

fn current_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
