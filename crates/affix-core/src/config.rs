//! Explicit configuration objects for storage and ingestion.
//!
//! Site-wide tunables are carried as values passed into the services that
//! need them, never as ambient global state. `from_env()` reads `AFFIX_*`
//! variables with fallback to defaults; unparseable values keep the default
//! and emit a WARN.

use std::path::PathBuf;

use crate::defaults;

/// Where attachment bytes and derived artifacts live on disk.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage root; the `attachments/` shard tree is created beneath it.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(defaults::DEFAULT_DATA_DIR),
        }
    }
}

impl StorageConfig {
    /// Create a configuration rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("AFFIX_DATA_DIR") {
            if val.trim().is_empty() {
                tracing::warn!(value = %val, "Empty AFFIX_DATA_DIR, using default");
            } else {
                config.root = PathBuf::from(val);
            }
        }
        config
    }
}

/// Limits applied while ingesting one upload.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum accepted upload size in bytes.
    pub max_upload_size: u64,
    /// Maximum decompressed size of one archive member in bytes.
    pub max_entry_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_size: defaults::MAX_UPLOAD_SIZE_BYTES,
            max_entry_size: defaults::MAX_ENTRY_SIZE_BYTES,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AFFIX_MAX_UPLOAD_SIZE_BYTES") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid AFFIX_MAX_UPLOAD_SIZE_BYTES, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("AFFIX_MAX_ENTRY_SIZE_BYTES") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.max_entry_size = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid AFFIX_MAX_ENTRY_SIZE_BYTES, using default")
                }
            }
        }

        config
    }
}
