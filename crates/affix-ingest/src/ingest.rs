//! Ingestion orchestrator: one upload in, one or many attachments out.
//!
//! Classification is by content sniffing only. A zip container fans out into
//! one attachment per member, collecting member failures without aborting
//! the batch; anything else becomes a single attachment whose bytes are
//! hard-linked from the upload's temp location when possible and copied
//! otherwise.

use std::path::Path;
use std::time::Instant;

use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use affix_core::{
    defaults::SNIFF_PREFIX_BYTES, detect_content_type, is_zip_container, sniff, Error,
    IngestConfig, IngestFailure, IngestReport, Result,
};
use affix_db::AttachmentStore;

use crate::expand::ZipExpander;

/// Drives uploads through sniffing, expansion, and storage.
#[derive(Clone)]
pub struct Ingestor {
    store: AttachmentStore,
    config: IngestConfig,
}

impl Ingestor {
    /// Create an orchestrator over the given store and limits.
    pub fn new(store: AttachmentStore, config: IngestConfig) -> Self {
        Self { store, config }
    }

    /// The store this orchestrator writes through.
    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    /// Ingest one upload delivered at a temporary filesystem location.
    ///
    /// `file_name` is the client-supplied display name; it is used verbatim
    /// for naming and only its extension is ever consulted, as a fallback
    /// for text content types. Archive-vs-file classification comes from
    /// the sniffed content type alone.
    ///
    /// Archive uploads return a report that may carry per-member failures
    /// alongside the successfully created attachments. An unreadable
    /// container, or a failed single-file write, aborts the whole request
    /// with zero attachments created.
    pub async fn ingest_upload(
        &self,
        page_id: i64,
        file_name: &str,
        temp_path: &Path,
    ) -> Result<IngestReport> {
        let start = Instant::now();

        let upload_size = tokio::fs::metadata(temp_path).await?.len();
        if upload_size > self.config.max_upload_size {
            return Err(Error::InvalidInput(format!(
                "upload of {} bytes exceeds the {} byte limit",
                upload_size, self.config.max_upload_size
            )));
        }

        let mut head = vec![0u8; SNIFF_PREFIX_BYTES.min(upload_size as usize)];
        {
            let mut file = tokio::fs::File::open(temp_path).await?;
            file.read_exact(&mut head).await?;
        }
        let mime = sniff(&head);

        let report = if is_zip_container(mime) {
            self.ingest_archive(page_id, temp_path).await?
        } else {
            self.ingest_single(page_id, file_name, &head, temp_path)
                .await?
        };

        info!(
            subsystem = "ingest",
            component = "ingestor",
            op = "ingest_upload",
            page_id,
            result_count = report.created_count(),
            failure_count = report.failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload ingested"
        );
        Ok(report)
    }

    /// Fan an archive out into one attachment per extractable member.
    async fn ingest_archive(&self, page_id: i64, temp_path: &Path) -> Result<IngestReport> {
        let file = std::fs::File::open(temp_path)?;
        let mut expander = ZipExpander::open(file)?;

        debug!(
            subsystem = "ingest",
            component = "ingestor",
            op = "expand",
            page_id,
            result_count = expander.raw_entry_count(),
            "Expanding archive upload"
        );

        let mut report = IngestReport::default();
        loop {
            let entry = match expander.next_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(Error::ArchiveEntry { name, reason }) => {
                    warn!(entry_name = %name, error = %reason, "Unreadable archive member");
                    report.failures.push(IngestFailure {
                        entry: name,
                        message: reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            if entry.size > self.config.max_entry_size {
                report.failures.push(IngestFailure {
                    entry: entry.name.clone(),
                    message: format!(
                        "member of {} bytes exceeds the {} byte limit",
                        entry.size, self.config.max_entry_size
                    ),
                });
                continue;
            }

            let prefix = match expander.read_prefix(&entry, SNIFF_PREFIX_BYTES) {
                Ok(prefix) => prefix,
                Err(Error::ArchiveEntry { name, reason }) => {
                    report.failures.push(IngestFailure {
                        entry: name,
                        message: reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            let content_type = detect_content_type(&entry.name, &prefix);

            let created = self
                .store
                .create_with_writer(page_id, &entry.name, &content_type, |dest: &Path| {
                    expander
                        .extract_to(&entry, dest)
                        .map_err(std::io::Error::other)
                })
                .await;

            match created {
                Ok(attachment) => report.attachments.push(attachment),
                Err(e) => {
                    warn!(entry_name = %entry.name, error = %e, "Archive member not ingested");
                    report.failures.push(IngestFailure {
                        entry: entry.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Store one plain upload, preferring a zero-copy link from the temp
    /// location and falling back to a copy (cross-device temp storage).
    async fn ingest_single(
        &self,
        page_id: i64,
        file_name: &str,
        head: &[u8],
        temp_path: &Path,
    ) -> Result<IngestReport> {
        let content_type = detect_content_type(file_name, head);
        let source = temp_path.to_path_buf();

        let attachment = self
            .store
            .create_with_writer(page_id, file_name, &content_type, move |dest: &Path| {
                match std::fs::hard_link(&source, dest) {
                    Ok(()) => std::fs::metadata(dest).map(|m| m.len()),
                    Err(_) => std::fs::copy(&source, dest),
                }
            })
            .await?;

        Ok(IngestReport {
            attachments: vec![attachment],
            failures: Vec::new(),
        })
    }
}
