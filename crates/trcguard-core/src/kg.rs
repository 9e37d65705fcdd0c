//! Knowledge graph documents.
//!
//! A knowledge graph (KG) document is produced once per uploaded database
//! schema and stored externally. The safety layer only ever reads the
//! `generatedKg.tables` mapping from it; the other fields are carried through
//! untouched so stored documents round-trip without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::policy::SchemaPolicy;

/// A knowledge graph document describing one database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgDocument {
    /// The DDL the document was generated from.
    #[serde(default)]
    pub schema_content: String,

    /// Tables and columns that must always exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound_schema: Option<Value>,

    /// Every table and column the database may expose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound_schema: Option<Value>,

    /// The generated graph.
    #[serde(default)]
    pub generated_kg: GeneratedKg,
}

/// The generated portion of a KG document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedKg {
    /// Raw table mapping. Kept as an untyped value so malformed entries can be
    /// skipped individually instead of rejecting the whole document.
    #[serde(default)]
    pub tables: Value,
}

/// Errors raised while loading a KG document.
#[derive(Debug, thiserror::Error)]
pub enum KgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KgDocument {
    /// Build a document around an already generated table mapping.
    pub fn with_tables(tables: Value) -> Self {
        Self {
            generated_kg: GeneratedKg { tables },
            ..Self::default()
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(content: &str) -> Result<Self, KgError> {
        serde_json::from_str(content).map_err(KgError::from)
    }

    /// Load a document from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KgError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// The raw table mapping, if it is an object.
    pub fn tables(&self) -> Option<&Map<String, Value>> {
        self.generated_kg.tables.as_object()
    }

    /// Normalize the table mapping into a schema policy.
    pub fn policy(&self) -> SchemaPolicy {
        SchemaPolicy::normalize(&self.generated_kg.tables)
    }

    /// Table name → column names, both sorted by name.
    ///
    /// Used to describe the schema to a SQL generator. Table names are kept
    /// exactly as they appear in the document.
    pub fn table_columns(&self) -> BTreeMap<String, Vec<String>> {
        let Some(tables) = self.tables() else {
            return BTreeMap::new();
        };

        tables
            .iter()
            .filter_map(|(name, entry)| {
                let entry = entry.as_object()?;
                let columns = entry
                    .get("columns")
                    .and_then(Value::as_object)
                    .map(|cols| cols.keys().cloned().collect())
                    .unwrap_or_default();
                Some((name.clone(), columns))
            })
            .collect()
    }
}
