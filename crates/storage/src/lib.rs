//! BasketApp Storage Layer
//!
//! This crate owns the hybrid Elassandra storage used by BasketApp: a
//! Cassandra row store whose rows are transparently mirrored into an
//! Elasticsearch index by the backend. It provides:
//!
//! - **Secure transport** ([`security`]): one TLS trust/identity context
//!   built from environment-supplied material and shared by the binary CQL
//!   client and the HTTPS Elasticsearch client.
//! - **Query translation** ([`query`]): typed store/product filters turned
//!   into the Elasticsearch query DSL document that Elassandra accepts as a
//!   CQL-embedded search.
//! - **Lifecycle management** ([`storage`]): idempotent open/init/cleanup/
//!   close transitions around a single shared session, with one-time schema
//!   and index bootstrap.
//! - **Typed accessors** ([`accessor`]): the read/write façade handlers use
//!   for get-by-id, save and search.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use basketapp_storage::{ElassandraStorage, SecureTransport, StorageConfig};
//! use basketapp_storage::model::Basket;
//!
//! # async fn run() -> basketapp_storage::StorageResult<()> {
//! let storage = Arc::new(ElassandraStorage::new(
//!     StorageConfig::default(),
//!     SecureTransport::from_env(),
//! ));
//! storage.open().await?;
//!
//! let baskets = storage.accessor::<Basket>()?;
//! let found = baskets.get_by_id(uuid::Uuid::new_v4()).await?;
//! assert!(found.is_none());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod accessor;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod schema;
pub mod security;
pub mod session;
pub mod storage;

// Re-export commonly used types at crate root
pub use accessor::{Accessor, Record, RecordKind};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use security::SecureTransport;
pub use storage::ElassandraStorage;

/// The logical namespace (Cassandra keyspace and Elasticsearch index name)
/// holding every table of this service.
pub const KEYSPACE: &str = "baskets";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
