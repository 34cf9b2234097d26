//! # affix-db
//!
//! PostgreSQL metadata layer and filesystem attachment store for affix.
//!
//! This crate provides:
//! - Connection pool management
//! - The `attachment` metadata repository (PostgreSQL and in-memory)
//! - The filesystem attachment store with writer-callback transfers
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use affix_core::StorageConfig;
//! use affix_db::{create_pool, AttachmentStore, PgAttachmentRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/affix").await?;
//!     let repo = Arc::new(PgAttachmentRepository::new(pool));
//!     let store = AttachmentStore::new(repo, &StorageConfig::from_env());
//!     store.validate().await.map_err(affix_core::Error::Config)?;
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod mock;
pub mod pool;
pub mod store;

// Re-export core types
pub use affix_core::*;

pub use attachments::PgAttachmentRepository;
pub use mock::MemoryAttachmentRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use store::{derived_rel_path, primary_rel_path, AttachmentStore};

/// Run pending migrations.
#[cfg(feature = "migrations")]
pub async fn migrate(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
    Ok(())
}
