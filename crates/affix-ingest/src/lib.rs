//! # affix-ingest
//!
//! Upload ingestion pipeline for affix.
//!
//! This crate provides:
//! - [`ZipExpander`]: lazy expansion of zip containers
//! - [`DerivedCache`]: lazily cached thumbnails and inline renditions
//! - [`Ingestor`]: the orchestrator that turns one upload into one or many
//!   stored attachments, with per-member failure collection for archives

pub mod derive;
pub mod expand;
pub mod ingest;

// Re-export core types
pub use affix_core::*;

pub use derive::{derive_image, DerivedArtifact, DerivedCache};
pub use expand::{ZipEntryInfo, ZipExpander};
pub use ingest::Ingestor;
