//! Core traits for affix abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Attachment;

/// Request for creating a new attachment record.
///
/// The size starts at zero; the store records the real byte count once the
/// transfer into storage has succeeded.
#[derive(Debug, Clone)]
pub struct CreateAttachmentRequest {
    pub page_id: i64,
    pub name: String,
    pub content_type: String,
}

/// Repository for attachment metadata CRUD.
///
/// This is the database boundary of the subsystem: implementations reserve
/// identifiers, resolve them, and remove records. They never touch the
/// byte storage, which belongs to the attachment store.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Insert a new record, assigning its identifier.
    async fn insert(&self, req: CreateAttachmentRequest) -> Result<Attachment>;

    /// Fetch a record by identifier.
    async fn find(&self, id: i64) -> Result<Attachment>;

    /// List all attachments for a page, oldest first.
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<Attachment>>;

    /// Record the final byte count after a successful transfer.
    async fn set_size(&self, id: i64, size_bytes: i64) -> Result<()>;

    /// Delete the metadata record. The backing bytes are not touched.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check whether a record exists.
    async fn exists(&self, id: i64) -> Result<bool>;
}
