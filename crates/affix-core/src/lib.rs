//! # affix-core
//!
//! Core types, traits, and abstractions for the affix attachment service.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other affix crates depend on: the error taxonomy,
//! attachment models, the metadata repository boundary, content sniffing,
//! and shared configuration.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod sniff;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{IngestConfig, StorageConfig};
pub use error::{Error, Result};
pub use models::{Attachment, DerivationKind, IngestFailure, IngestReport};
pub use sniff::{detect_content_type, is_zip_container, sniff};
pub use traits::{AttachmentRepository, CreateAttachmentRequest};
