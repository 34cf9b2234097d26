//! Content-type sniffing from leading bytes.
//!
//! Classification never trusts a client-declared type or a filename
//! extension for binary formats: magic bytes decide. Extensions are only
//! consulted for text formats, which genuinely carry no signature. When
//! neither layer matches, the generic binary type is returned so that
//! ingestion can always proceed.

use crate::defaults::{FALLBACK_CONTENT_TYPE, ZIP_CONTENT_TYPE};

/// Detect the MIME type of a byte stream from its magic bytes alone.
///
/// Indeterminate input falls back to `application/octet-stream`; this
/// function never fails.
pub fn sniff(data: &[u8]) -> &'static str {
    match infer::get(data) {
        Some(kind) => kind.mime_type(),
        None => FALLBACK_CONTENT_TYPE,
    }
}

/// Detect a content type for storage, with a text-extension fallback.
///
/// 1. Magic bytes via `infer` (authoritative for binary formats).
/// 2. Extension table for text formats that have no magic bytes.
/// 3. `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if let Some(mime) = mime_from_extension(ext) {
            return mime.to_string();
        }
    }

    FALLBACK_CONTENT_TYPE.to_string()
}

/// Whether a sniffed type routes the upload through archive expansion.
///
/// Office containers (docx, xlsx, ...) are zip files on disk but sniff to
/// their own MIME types, so they are stored as single attachments.
pub fn is_zip_container(mime: &str) -> bool {
    mime == ZIP_CONTENT_TYPE
}

/// Map TEXT-ONLY extensions to MIME types (formats that lack magic bytes).
///
/// Binary media formats are intentionally excluded: those have well-defined
/// signatures, and if `infer` fails to detect them the content does not
/// match the extension.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        // Plain text
        "txt" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "tsv" => Some("text/tab-separated-values"),
        // Markup
        "html" | "htm" => Some("text/html"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "yaml" | "yml" => Some("application/yaml"),
        "toml" => Some("application/toml"),
        "md" | "markdown" => Some("text/markdown"),
        // Config files
        "ini" | "cfg" | "conf" => Some("text/plain"),
        // SVG is text-based XML, safe to trust by extension
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
