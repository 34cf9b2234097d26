//! End-to-end ingestion tests over the in-memory repository and a temp
//! storage root: classification, archive fan-out, partial failure, and
//! derived artifact caching.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use affix_core::{DerivationKind, Error, IngestConfig, StorageConfig};
use affix_db::{AttachmentStore, MemoryAttachmentRepository};
use affix_ingest::{DerivedCache, Ingestor};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

struct Fixture {
    ingestor: Ingestor,
    store: AttachmentStore,
    repo: MemoryAttachmentRepository,
    dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = MemoryAttachmentRepository::new();
    let store = AttachmentStore::new(
        Arc::new(repo.clone()),
        &StorageConfig::new(dir.path().join("storage")),
    );
    let ingestor = Ingestor::new(store.clone(), IngestConfig::default());
    Fixture {
        ingestor,
        store,
        repo,
        dir,
    }
}

impl Fixture {
    /// Drop an upload payload at a temp location, as the transport would.
    fn upload(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join("uploads").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        match body {
            Some(bytes) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => {
                writer.add_directory(*name, options).unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 120, 40, 255]),
    ));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[tokio::test]
async fn single_file_upload_creates_one_identical_attachment() {
    let fx = fixture();
    let temp = fx.upload("report.txt", b"quarterly numbers");

    let report = fx.ingestor.ingest_upload(1, "report.txt", &temp).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.created_count(), 1);

    let att = &report.attachments[0];
    assert_eq!(att.name, "report.txt");
    assert_eq!(att.content_type, "text/plain");
    assert_eq!(att.size_bytes, 17);

    let (_, stored) = fx.store.read(att.id).await.unwrap();
    assert_eq!(stored, b"quarterly numbers");
}

#[tokio::test]
async fn zip_upload_creates_one_attachment_per_member() {
    let fx = fixture();
    let bytes = build_zip(&[
        ("a.txt", Some(b"alpha".as_slice())),
        ("nested/b.txt", Some(b"bravo".as_slice())),
        ("c.txt", Some(b"charlie".as_slice())),
    ]);
    let temp = fx.upload("bundle.zip", &bytes);

    let report = fx.ingestor.ingest_upload(1, "bundle.zip", &temp).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.created_count(), 3);

    let names: Vec<&str> = report.attachments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "nested/b.txt", "c.txt"]);

    for (att, expected) in report
        .attachments
        .iter()
        .zip([b"alpha".as_slice(), b"bravo", b"charlie"])
    {
        let (_, stored) = fx.store.read(att.id).await.unwrap();
        assert_eq!(stored, expected, "member {} must round-trip", att.name);
    }
}

#[tokio::test]
async fn directory_members_are_skipped() {
    let fx = fixture();
    let bytes = build_zip(&[
        ("a.txt", Some(b"alpha".as_slice())),
        ("dir/", None),
        ("b.txt", Some(b"bravo".as_slice())),
    ]);
    let temp = fx.upload("tree.zip", &bytes);

    let report = fx.ingestor.ingest_upload(1, "tree.zip", &temp).await.unwrap();

    assert!(report.is_complete());
    let names: Vec<&str> = report.attachments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn corrupt_member_is_recorded_and_batch_continues() {
    let fx = fixture();
    let marker = b"0123456789ABCDEF";
    let mut bytes = build_zip(&[
        ("first.txt", Some(b"fine".as_slice())),
        ("bad.bin", Some(marker.as_slice())),
        ("last.txt", Some(b"also fine".as_slice())),
    ]);
    // Stored members keep their plaintext in the container; flipping one
    // content byte breaks that member's checksum and nothing else.
    let pos = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .unwrap();
    bytes[pos] ^= 0xFF;
    let temp = fx.upload("damaged.zip", &bytes);

    let report = fx.ingestor.ingest_upload(1, "damaged.zip", &temp).await.unwrap();

    assert_eq!(report.created_count(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].entry, "bad.bin");
    assert_eq!(fx.repo.len(), 2, "no metadata row for the failed member");

    let names: Vec<&str> = report.attachments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["first.txt", "last.txt"]);
}

#[tokio::test]
async fn garbage_archive_aborts_without_attachments() {
    let fx = fixture();
    // Starts with the zip local-header magic but is not an archive.
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend_from_slice(&[0u8; 64]);
    let temp = fx.upload("fake-archive.zip", &bytes);

    match fx.ingestor.ingest_upload(1, "fake-archive.zip", &temp).await {
        Err(Error::ArchiveOpen(_)) => {}
        other => panic!("Expected ArchiveOpen, got {:?}", other),
    }
    assert!(fx.repo.is_empty());
}

#[tokio::test]
async fn zip_named_text_upload_is_stored_as_plain_file() {
    let fx = fixture();
    let temp = fx.upload("photo.zip", b"hello");

    let report = fx.ingestor.ingest_upload(1, "photo.zip", &temp).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.created_count(), 1);

    let att = &report.attachments[0];
    assert_eq!(att.name, "photo.zip");
    assert_eq!(att.content_type, "application/octet-stream");
    assert_eq!(att.size_bytes, 5);

    let (_, stored) = fx.store.read(att.id).await.unwrap();
    assert_eq!(stored, b"hello");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = MemoryAttachmentRepository::new();
    let store = AttachmentStore::new(
        Arc::new(repo.clone()),
        &StorageConfig::new(dir.path().join("storage")),
    );
    let ingestor = Ingestor::new(
        store,
        IngestConfig {
            max_upload_size: 8,
            ..IngestConfig::default()
        },
    );

    let temp = dir.path().join("big.bin");
    std::fs::write(&temp, b"way more than eight").unwrap();

    match ingestor.ingest_upload(1, "big.bin", &temp).await {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("exceeds")),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert!(repo.is_empty());
}

#[tokio::test]
async fn oversized_member_is_a_recorded_failure() {
    let dir = TempDir::new().unwrap();
    let repo = MemoryAttachmentRepository::new();
    let store = AttachmentStore::new(
        Arc::new(repo.clone()),
        &StorageConfig::new(dir.path().join("storage")),
    );
    let ingestor = Ingestor::new(
        store,
        IngestConfig {
            max_entry_size: 4,
            ..IngestConfig::default()
        },
    );

    let bytes = build_zip(&[
        ("tiny.txt", Some(b"ok".as_slice())),
        ("large.txt", Some(b"far too large".as_slice())),
    ]);
    let temp = dir.path().join("mixed.zip");
    std::fs::write(&temp, &bytes).unwrap();

    let report = ingestor.ingest_upload(1, "mixed.zip", &temp).await.unwrap();

    assert_eq!(report.created_count(), 1);
    assert_eq!(report.attachments[0].name, "tiny.txt");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].entry, "large.txt");
    assert!(report.failures[0].message.contains("exceeds"));
}

#[tokio::test]
async fn delete_removes_metadata_but_keeps_bytes() {
    let fx = fixture();
    let temp = fx.upload("keep.txt", b"still on disk");

    let report = fx.ingestor.ingest_upload(1, "keep.txt", &temp).await.unwrap();
    let att = &report.attachments[0];
    let path = fx.store.primary_path(att.id);
    assert!(path.exists());

    fx.store.delete(att.id).await.unwrap();

    assert!(matches!(
        fx.store.metadata(att.id).await,
        Err(Error::AttachmentNotFound(_))
    ));
    assert!(path.exists());
}

#[tokio::test]
async fn thumbnail_derivation_is_cached_and_idempotent() {
    let fx = fixture();
    let temp = fx.upload("photo.png", &png_bytes(400, 300));

    let report = fx.ingestor.ingest_upload(1, "photo.png", &temp).await.unwrap();
    let att = &report.attachments[0];
    assert_eq!(att.content_type, "image/png");

    let cache = DerivedCache::new(fx.store.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let counting = {
        let calls = calls.clone();
        move |bytes: &[u8], content_type: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            affix_ingest::derive_image(bytes, content_type, DerivationKind::Thumbnail)
        }
    };

    let first = cache
        .get_or_create_with(att.id, DerivationKind::Thumbnail, counting.clone())
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.content_type, "image/png");

    let thumb = image::load_from_memory(&first.bytes).unwrap();
    assert!(thumb.width() <= 100 && thumb.height() <= 100);

    let second = cache
        .get_or_create_with(att.id, DerivationKind::Thumbnail, counting)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "cache hit must not re-derive");
    assert_eq!(second.bytes, first.bytes);
}

#[tokio::test]
async fn derivation_kinds_cache_independently() {
    let fx = fixture();
    let temp = fx.upload("photo.png", &png_bytes(1200, 900));

    let report = fx.ingestor.ingest_upload(1, "photo.png", &temp).await.unwrap();
    let att = &report.attachments[0];

    let cache = DerivedCache::new(fx.store.clone());
    let thumb = cache
        .get_or_create(att.id, DerivationKind::Thumbnail)
        .await
        .unwrap();
    let inline = cache
        .get_or_create(att.id, DerivationKind::Inline)
        .await
        .unwrap();

    assert_ne!(thumb.bytes, inline.bytes);
    assert!(fx.store.derived_path(att.id, DerivationKind::Thumbnail).exists());
    assert!(fx.store.derived_path(att.id, DerivationKind::Inline).exists());
}

#[tokio::test]
async fn concurrent_first_derivations_converge() {
    let fx = fixture();
    let temp = fx.upload("photo.png", &png_bytes(640, 480));

    let report = fx.ingestor.ingest_upload(1, "photo.png", &temp).await.unwrap();
    let id = report.attachments[0].id;

    let cache = DerivedCache::new(fx.store.clone());
    let a = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get_or_create(id, DerivationKind::Thumbnail).await })
    };
    let b = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get_or_create(id, DerivationKind::Thumbnail).await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!(a.bytes, b.bytes);

    let cached = cache
        .get_or_create(id, DerivationKind::Thumbnail)
        .await
        .unwrap();
    assert_eq!(cached.bytes, a.bytes);
}

#[tokio::test]
async fn derivation_failure_leaves_source_retrievable() {
    let fx = fixture();
    let temp = fx.upload("notes.txt", b"not an image");

    let report = fx.ingestor.ingest_upload(1, "notes.txt", &temp).await.unwrap();
    let att = &report.attachments[0];

    let cache = DerivedCache::new(fx.store.clone());
    match cache.get_or_create(att.id, DerivationKind::Thumbnail).await {
        Err(Error::Derivation(_)) => {}
        other => panic!("Expected Derivation error, got {:?}", other),
    }

    let (_, bytes) = fx.store.read(att.id).await.unwrap();
    assert_eq!(bytes, b"not an image");
}

#[tokio::test]
async fn derivation_for_unknown_attachment_is_not_found() {
    let fx = fixture();
    let cache = DerivedCache::new(fx.store.clone());
    assert!(matches!(
        cache.get_or_create(404, DerivationKind::Inline).await,
        Err(Error::AttachmentNotFound(404))
    ));
}

#[tokio::test]
async fn upload_lands_in_id_derived_shard_path() {
    let fx = fixture();
    let temp = fx.upload("a.txt", b"shard me");

    let report = fx.ingestor.ingest_upload(1, "a.txt", &temp).await.unwrap();
    let att = &report.attachments[0];

    let path = fx.store.primary_path(att.id);
    let rel: &Path = path.strip_prefix(fx.dir.path()).unwrap();
    assert!(rel.starts_with("storage/attachments"));
    assert!(path.exists());
}
