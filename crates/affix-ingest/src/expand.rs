//! Zip archive expansion.
//!
//! [`ZipExpander`] walks a zip container as a lazy, forward-only sequence of
//! non-directory members. Directory entries are filtered out before being
//! yielded. Member bytes are materialized by streaming into a destination
//! path, so a large member never has to fit in memory.
//!
//! Opening rejects byte streams that are not valid zip containers; per-member
//! read failures (truncated data, checksum mismatches) are reported per
//! entry so a batch can continue past them.

use std::io::{Read, Seek};
use std::path::Path;

use tracing::trace;
use zip::ZipArchive;

use affix_core::{Error, Result};

/// Metadata for one non-directory archive member.
#[derive(Debug, Clone)]
pub struct ZipEntryInfo {
    /// Index within the archive, used to reopen the member for extraction.
    pub index: usize,
    /// Stored member name, kept verbatim (may contain path separators).
    pub name: String,
    /// Declared decompressed size in bytes.
    pub size: u64,
}

/// Lazy expander over a zip container.
pub struct ZipExpander<R: Read + Seek> {
    archive: ZipArchive<R>,
    cursor: usize,
}

impl<R: Read + Seek> ZipExpander<R> {
    /// Open a zip container.
    ///
    /// Fails with [`Error::ArchiveOpen`] when the byte stream is not a
    /// readable archive (corrupt header, missing central directory).
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader).map_err(|e| Error::ArchiveOpen(e.to_string()))?;
        Ok(Self { archive, cursor: 0 })
    }

    /// Total number of raw entries, directories included.
    pub fn raw_entry_count(&self) -> usize {
        self.archive.len()
    }

    /// Advance to the next non-directory member.
    ///
    /// Returns `Ok(None)` once the archive is exhausted. An unreadable
    /// central-directory record is reported as [`Error::ArchiveEntry`] and
    /// the walk can continue with the next call.
    pub fn next_entry(&mut self) -> Result<Option<ZipEntryInfo>> {
        while self.cursor < self.archive.len() {
            let index = self.cursor;
            self.cursor += 1;

            let entry = self.archive.by_index(index).map_err(|e| Error::ArchiveEntry {
                name: format!("#{}", index),
                reason: e.to_string(),
            })?;

            if entry.is_dir() {
                trace!(
                    subsystem = "ingest",
                    component = "zip_expander",
                    entry_name = entry.name(),
                    "Skipping directory entry"
                );
                continue;
            }

            return Ok(Some(ZipEntryInfo {
                index,
                name: entry.name().to_string(),
                size: entry.size(),
            }));
        }
        Ok(None)
    }

    /// Stream a member's decompressed bytes to `dest`.
    ///
    /// Returns the number of bytes written. Data errors (truncation, bad
    /// checksum) surface as [`Error::ArchiveEntry`] for this member only.
    pub fn extract_to(&mut self, entry: &ZipEntryInfo, dest: &Path) -> Result<u64> {
        let member_err = |e: String| Error::ArchiveEntry {
            name: entry.name.clone(),
            reason: e,
        };

        let mut member = self
            .archive
            .by_index(entry.index)
            .map_err(|e| member_err(e.to_string()))?;

        let mut out = std::fs::File::create(dest).map_err(|e| member_err(e.to_string()))?;
        let written =
            std::io::copy(&mut member, &mut out).map_err(|e| member_err(e.to_string()))?;
        Ok(written)
    }

    /// Read up to `limit` leading bytes of a member, for content sniffing.
    pub fn read_prefix(&mut self, entry: &ZipEntryInfo, limit: usize) -> Result<Vec<u8>> {
        let member = self
            .archive
            .by_index(entry.index)
            .map_err(|e| Error::ArchiveEntry {
                name: entry.name.clone(),
                reason: e.to_string(),
            })?;

        let mut prefix = Vec::with_capacity(limit.min(entry.size as usize));
        member
            .take(limit as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| Error::ArchiveEntry {
                name: entry.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(prefix)
    }
}
