//! # trcguard-core
//!
//! Types shared by every trcguard crate:
//! - [`KgDocument`]: the knowledge graph document stored per database
//! - [`SchemaPolicy`]: the case-insensitive table/column allow-list derived
//!   from a document's `generatedKg.tables`

pub mod kg;
pub mod policy;

pub use kg::{GeneratedKg, KgDocument, KgError};
pub use policy::{SchemaPolicy, TablePolicy};
