//! In-memory attachment repository for deterministic testing.
//!
//! Identifiers are assigned from a monotonically increasing counter, so
//! tests get stable ids without a database.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use affix_db::mock::MemoryAttachmentRepository;
//!
//! #[tokio::test]
//! async fn test_with_memory_repo() {
//!     let repo = MemoryAttachmentRepository::new();
//!     let att = repo.insert(CreateAttachmentRequest { .. }).await.unwrap();
//!     assert_eq!(att.id, 1);
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use affix_core::{Attachment, AttachmentRepository, CreateAttachmentRequest, Error, Result};

#[derive(Debug)]
struct MemoryState {
    next_id: i64,
    rows: BTreeMap<i64, Attachment>,
}

/// In-memory repository backed by a mutex-guarded map.
#[derive(Clone)]
pub struct MemoryAttachmentRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAttachmentRepository {
    /// Create an empty repository; the first assigned identifier is 1.
    pub fn new() -> Self {
        Self::with_start_id(1)
    }

    /// Create an empty repository whose first identifier is `start_id`.
    pub fn with_start_id(start_id: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                next_id: start_id,
                rows: BTreeMap::new(),
            })),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAttachmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttachmentRepository for MemoryAttachmentRepository {
    async fn insert(&self, req: CreateAttachmentRequest) -> Result<Attachment> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;

        let attachment = Attachment {
            id,
            page_id: req.page_id,
            name: req.name,
            content_type: req.content_type,
            size_bytes: 0,
            created_at: Utc::now(),
        };
        state.rows.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn find(&self, id: i64) -> Result<Attachment> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(&id)
            .cloned()
            .ok_or(Error::AttachmentNotFound(id))
    }

    async fn list_by_page(&self, page_id: i64) -> Result<Vec<Attachment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .values()
            .filter(|a| a.page_id == page_id)
            .cloned()
            .collect())
    }

    async fn set_size(&self, id: i64, size_bytes: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.rows.get_mut(&id) {
            Some(row) => {
                row.size_bytes = size_bytes;
                Ok(())
            }
            None => Err(Error::AttachmentNotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.state.lock().unwrap().rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::AttachmentNotFound(id)),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.state.lock().unwrap().rows.contains_key(&id))
    }
}
