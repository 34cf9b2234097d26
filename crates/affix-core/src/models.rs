//! Data models shared across the affix crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Metadata for one stored attachment.
///
/// The identifier is assigned by the repository at creation and is immutable;
/// the backing bytes live at a storage location derived from it. The display
/// name is stored exactly as supplied, so names taken from archive members may
/// contain path separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub page_id: i64,
    pub name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Kinds of derived artifacts produced from an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationKind {
    /// Small square-ish preview, fits within 100x100.
    Thumbnail,
    /// Page-embeddable rendition, fits within 800x600. Never upscales.
    Inline,
}

impl DerivationKind {
    /// Filename suffix used for the cached artifact, e.g. `{id}.thumb.bin`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumb",
            Self::Inline => "inline",
        }
    }

    /// Maximum pixel bounds (width, height) the derived image must fit in.
    pub fn max_bounds(&self) -> (u32, u32) {
        match self {
            Self::Thumbnail => (
                defaults::THUMBNAIL_MAX_WIDTH,
                defaults::THUMBNAIL_MAX_HEIGHT,
            ),
            Self::Inline => (defaults::INLINE_MAX_WIDTH, defaults::INLINE_MAX_HEIGHT),
        }
    }
}

impl std::fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Inline => write!(f, "inline"),
        }
    }
}

impl std::str::FromStr for DerivationKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thumbnail" | "thumb" => Ok(Self::Thumbnail),
            "inline" => Ok(Self::Inline),
            _ => Err(format!("Invalid derivation kind: {}", s)),
        }
    }
}

/// One recorded failure while processing an archive member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Stored name of the archive member that failed.
    pub entry: String,
    /// Human-readable reason.
    pub message: String,
}

/// Outcome of one ingestion request.
///
/// Archive uploads may partially succeed: every member that could be
/// extracted becomes an attachment, and every member that could not is
/// recorded here in archive order. Single-file uploads either produce
/// exactly one attachment or fail the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub attachments: Vec<Attachment>,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// True when every processed item was ingested.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of attachments created by this request.
    pub fn created_count(&self) -> usize {
        self.attachments.len()
    }
}
