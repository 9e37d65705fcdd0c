//! # trcguard-store
//!
//! Persistence for knowledge graph documents, keyed by database id.
//!
//! - [`FileKgStore`] writes one `<id>.json` file per database
//! - [`MemoryKgStore`] keeps documents in process memory

pub mod error;
pub mod storage;

pub use error::StoreError;
pub use storage::{FileKgStore, KgStore, MemoryKgStore, StoreBackend, create_store};
