//! Centralized default constants for the affix system.
//!
//! **This module is the single source of truth** for all shared default
//! values. The other crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// SNIFFING
// =============================================================================

/// Number of leading bytes read for content-type sniffing.
///
/// Every supported magic signature fits well within this prefix, so the
/// orchestrator never needs to buffer a whole upload just to classify it.
pub const SNIFF_PREFIX_BYTES: usize = 8192;

/// Content type assigned when sniffing is indeterminate.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type that routes an upload through archive expansion.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum upload size in bytes (50 MB).
/// Configurable via `AFFIX_MAX_UPLOAD_SIZE_BYTES`.
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum decompressed size of a single archive member (100 MB).
/// Configurable via `AFFIX_MAX_ENTRY_SIZE_BYTES`.
///
/// Members beyond this are rejected individually so that one oversized (or
/// zip-bombed) member cannot exhaust memory or abort the rest of the batch.
pub const MAX_ENTRY_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Maximum stored display-name length (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;

// =============================================================================
// DERIVED ARTIFACTS
// =============================================================================

/// Thumbnail bounding box width in pixels.
pub const THUMBNAIL_MAX_WIDTH: u32 = 100;

/// Thumbnail bounding box height in pixels.
pub const THUMBNAIL_MAX_HEIGHT: u32 = 100;

/// Inline rendition bounding box width in pixels.
pub const INLINE_MAX_WIDTH: u32 = 800;

/// Inline rendition bounding box height in pixels.
pub const INLINE_MAX_HEIGHT: u32 = 600;

// =============================================================================
// STORAGE LAYOUT
// =============================================================================

/// Number of shard directories under the attachment root.
pub const STORAGE_SHARD_BUCKETS: i64 = 1000;

/// Default storage root when `AFFIX_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "data";
