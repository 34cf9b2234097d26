//! Filesystem attachment store.
//!
//! Pairs metadata records with on-disk bytes. The store owns *where* bytes
//! live: every attachment's primary file sits at a path derived from its
//! identifier, and derived artifacts sit next to it under a kind suffix.
//! Callers own *how* bytes get there, via the writer callback passed to
//! [`AttachmentStore::create_with_writer`]: a hard link for co-located temp
//! uploads, a copy across devices, or a streamed archive extraction.
//!
//! Creation is reserve-then-write: the metadata row is inserted first (it
//! assigns the identifier the destination path needs), then the writer runs,
//! and on writer failure the reservation is rolled back so metadata and
//! bytes always exist together.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use affix_core::{
    defaults::STORAGE_SHARD_BUCKETS, Attachment, AttachmentRepository, CreateAttachmentRequest,
    DerivationKind, Error, Result, StorageConfig,
};

/// Sequence for unique temp-file names during writes.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Storage-relative path of an attachment's primary bytes.
///
/// Path format: `attachments/{id mod 1000, zero padded}/{id}.bin`
///
/// Example: `attachments/042/5042.bin`
pub fn primary_rel_path(id: i64) -> String {
    format!(
        "attachments/{:03}/{}.bin",
        id.rem_euclid(STORAGE_SHARD_BUCKETS),
        id
    )
}

/// Storage-relative path of a derived artifact, co-located with the primary.
///
/// Example: `attachments/042/5042.thumb.bin`
pub fn derived_rel_path(id: i64, kind: DerivationKind) -> String {
    format!(
        "attachments/{:03}/{}.{}.bin",
        id.rem_euclid(STORAGE_SHARD_BUCKETS),
        id,
        kind.suffix()
    )
}

/// Attachment store over a metadata repository and a storage root.
#[derive(Clone)]
pub struct AttachmentStore {
    repo: Arc<dyn AttachmentRepository>,
    root: PathBuf,
}

impl AttachmentStore {
    /// Create a store over the given repository and storage configuration.
    pub fn new(repo: Arc<dyn AttachmentRepository>, config: &StorageConfig) -> Self {
        Self {
            repo,
            root: config.root.clone(),
        }
    }

    /// The metadata repository backing this store.
    pub fn repository(&self) -> &Arc<dyn AttachmentRepository> {
        &self.repo
    }

    /// Absolute path of an attachment's primary bytes.
    pub fn primary_path(&self, id: i64) -> PathBuf {
        self.root.join(primary_rel_path(id))
    }

    /// Absolute path of a derived artifact for (id, kind).
    pub fn derived_path(&self, id: i64, kind: DerivationKind) -> PathBuf {
        self.root.join(derived_rel_path(id, kind))
    }

    /// Validate that the storage root can be written, read, and cleaned up.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, read-only mounts, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.root.join("attachments/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }

    /// Create an attachment, letting `writer` deposit the bytes.
    ///
    /// The writer receives a destination path chosen by the store and
    /// returns the number of bytes it placed there. The path is a unique
    /// temp file next to the final location; it is renamed into place only
    /// after the writer succeeds, so a half-written file is never visible
    /// under the attachment's path. On writer failure the reserved metadata
    /// row and the temp file are removed and [`Error::AttachmentWrite`] is
    /// returned.
    pub async fn create_with_writer<W>(
        &self,
        page_id: i64,
        name: &str,
        content_type: &str,
        writer: W,
    ) -> Result<Attachment>
    where
        W: FnOnce(&Path) -> std::io::Result<u64>,
    {
        let mut attachment = self
            .repo
            .insert(CreateAttachmentRequest {
                page_id,
                name: name.to_string(),
                content_type: content_type.to_string(),
            })
            .await?;

        let dest = self.primary_path(attachment.id);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = dest.with_extension(format!(
            "bin.tmp.{}.{}",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = match writer(&tmp) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "attachment_store",
                    op = "create",
                    attachment_id = attachment.id,
                    entry_name = name,
                    error = %e,
                    "Writer failed, rolling back reservation"
                );
                let _ = fs::remove_file(&tmp).await;
                if let Err(rollback_err) = self.repo.delete(attachment.id).await {
                    warn!(
                        attachment_id = attachment.id,
                        error = %rollback_err,
                        "Rollback of reserved metadata failed"
                    );
                }
                return Err(Error::AttachmentWrite(format!("{}: {}", name, e)));
            }
        };

        fs::rename(&tmp, &dest).await?;

        // Stored bytes are data, never executable.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o644)).await?;
        }

        self.repo.set_size(attachment.id, written as i64).await?;
        attachment.size_bytes = written as i64;

        debug!(
            subsystem = "store",
            component = "attachment_store",
            op = "create",
            attachment_id = attachment.id,
            page_id,
            size_bytes = written,
            "Attachment stored"
        );
        Ok(attachment)
    }

    /// Fetch the metadata record for an attachment.
    pub async fn metadata(&self, id: i64) -> Result<Attachment> {
        self.repo.find(id).await
    }

    /// Open the primary bytes of an attachment as a stream.
    ///
    /// Resolves the metadata first, so a missing record surfaces as
    /// [`Error::AttachmentNotFound`]. A record without its backing file is
    /// an invariant violation and surfaces as [`Error::Internal`].
    pub async fn open_stream(&self, id: i64) -> Result<(Attachment, fs::File)> {
        let attachment = self.repo.find(id).await?;
        let path = self.primary_path(id);
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Internal(format!("attachment {} has no backing file", id))
            } else {
                Error::Io(e)
            }
        })?;
        Ok((attachment, file))
    }

    /// Read the full primary bytes of an attachment.
    pub async fn read(&self, id: i64) -> Result<(Attachment, Vec<u8>)> {
        let (attachment, mut file) = self.open_stream(id).await?;
        let mut bytes = Vec::with_capacity(attachment.size_bytes.max(0) as usize);
        tokio::io::AsyncReadExt::read_to_end(&mut file, &mut bytes).await?;
        Ok((attachment, bytes))
    }

    /// Delete the attachment's metadata record.
    ///
    /// The backing file stays on disk: removal requests only ever drop the
    /// record, so an ambiguous request cannot destroy bytes.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repo.delete(id).await?;
        debug!(
            subsystem = "store",
            component = "attachment_store",
            op = "delete",
            attachment_id = id,
            "Attachment metadata deleted, bytes retained"
        );
        Ok(())
    }
}
