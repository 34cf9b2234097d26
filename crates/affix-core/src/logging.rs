//! Structured logging schema and field name constants for affix.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, ingestion completions |
//! | DEBUG | Decision points, transfer strategy choices |
//! | TRACE | Per-member iteration inside archive expansion |

// Identity fields

/// Subsystem originating the log event.
/// Values: "db", "store", "ingest", "derive"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "attachment_store", "zip_expander", "derived_cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "ingest_upload", "get_or_create", "delete"
pub const OPERATION: &str = "op";

// Entity fields

/// Attachment identifier being operated on.
pub const ATTACHMENT_ID: &str = "attachment_id";

/// Owning page identifier.
pub const PAGE_ID: &str = "page_id";

/// Archive member name being processed.
pub const ENTRY_NAME: &str = "entry_name";

/// Derivation kind ("thumbnail", "inline").
pub const KIND: &str = "kind";

// Measurement fields

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte count written or read.
pub const SIZE_BYTES: &str = "size_bytes";

/// Number of items produced by an operation.
pub const RESULT_COUNT: &str = "result_count";

// Outcome fields

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
