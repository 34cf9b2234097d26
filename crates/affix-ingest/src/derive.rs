//! Derived artifact cache: thumbnails and inline renditions.
//!
//! Derivations are computed lazily. The presence of the cached file at the
//! derived storage path is the cache-hit signal; there is no separate
//! bookkeeping. A cache miss loads the source bytes, runs the derivation on
//! the blocking pool, and publishes the result with a unique temp file plus
//! rename, so concurrent first requests for the same artifact can only race
//! on wasted work, never on partially written files. Output bytes are
//! deterministic for a given source, so last-writer-wins is harmless.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};

use image::{DynamicImage, ImageFormat};
use tokio::fs;
use tracing::{debug, trace};

use affix_core::{DerivationKind, Error, Result};
use affix_db::AttachmentStore;

/// Sequence for unique temp-file names during cache publication.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A derived byte stream plus the content type it is served under.
///
/// The content type is inherited from the source attachment.
#[derive(Debug, Clone)]
pub struct DerivedArtifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Lazily populated cache of derived artifacts, keyed by (attachment, kind).
#[derive(Clone)]
pub struct DerivedCache {
    store: AttachmentStore,
}

impl DerivedCache {
    /// Create a cache over the given store.
    pub fn new(store: AttachmentStore) -> Self {
        Self { store }
    }

    /// Return the derived artifact for (id, kind), deriving it on first use.
    pub async fn get_or_create(&self, id: i64, kind: DerivationKind) -> Result<DerivedArtifact> {
        self.get_or_create_with(id, kind, move |bytes, content_type| {
            derive_image(bytes, content_type, kind)
        })
        .await
    }

    /// Like [`get_or_create`](Self::get_or_create), with a caller-supplied
    /// derivation.
    ///
    /// `derive` receives the source bytes and content type and returns the
    /// derived bytes; it runs on the blocking pool and is only invoked on a
    /// cache miss.
    pub async fn get_or_create_with<F>(
        &self,
        id: i64,
        kind: DerivationKind,
        derive: F,
    ) -> Result<DerivedArtifact>
    where
        F: FnOnce(&[u8], &str) -> Result<Vec<u8>> + Send + 'static,
    {
        let metadata = self.store.metadata(id).await?;
        let cache_path = self.store.derived_path(id, kind);

        match fs::read(&cache_path).await {
            Ok(bytes) => {
                trace!(
                    subsystem = "derive",
                    component = "derived_cache",
                    attachment_id = id,
                    kind = %kind,
                    "Cache hit"
                );
                return Ok(DerivedArtifact {
                    content_type: metadata.content_type,
                    bytes,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let (_, source) = self.store.read(id).await?;
        let content_type = metadata.content_type.clone();
        let derived = tokio::task::spawn_blocking(move || derive(&source, &content_type))
            .await
            .map_err(|e| Error::Internal(format!("derivation task failed: {}", e)))??;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = cache_path.with_extension(format!(
            "bin.tmp.{}.{}",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, &derived).await?;
        fs::rename(&tmp, &cache_path).await?;

        debug!(
            subsystem = "derive",
            component = "derived_cache",
            attachment_id = id,
            kind = %kind,
            size_bytes = derived.len(),
            "Derived artifact cached"
        );
        Ok(DerivedArtifact {
            content_type: metadata.content_type,
            bytes: derived,
        })
    }
}

/// Built-in image derivation: fit the source within the kind's pixel bounds.
///
/// A source already inside the bounds is passed through unchanged, so small
/// images are never upscaled and keep their exact bytes. The output is
/// re-encoded in the source format when the codec supports writing it, PNG
/// otherwise.
pub fn derive_image(bytes: &[u8], content_type: &str, kind: DerivationKind) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::Derivation(format!("decode ({}): {}", content_type, e)))?;

    let (max_w, max_h) = kind.max_bounds();
    if img.width() <= max_w && img.height() <= max_h {
        return Ok(bytes.to_vec());
    }

    let resized = match kind {
        DerivationKind::Thumbnail => img.thumbnail(max_w, max_h),
        DerivationKind::Inline => {
            img.resize(max_w, max_h, image::imageops::FilterType::Lanczos3)
        }
    };
    encode(&resized, content_type)
}

fn encode(img: &DynamicImage, content_type: &str) -> Result<Vec<u8>> {
    let format = ImageFormat::from_mime_type(content_type).unwrap_or(ImageFormat::Png);

    let mut out = Vec::new();
    if img.write_to(&mut Cursor::new(&mut out), format).is_ok() {
        return Ok(out);
    }

    // Decodable but not encodable source format, publish as PNG instead.
    out.clear();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| Error::Derivation(format!("encode: {}", e)))?;
    Ok(out)
}
