//! Knowledge graph storage backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use trcguard_core::KgDocument;
use uuid::Uuid;

use crate::error::StoreError;

/// Trait for knowledge graph storage backends.
#[async_trait]
pub trait KgStore: Send + Sync {
    /// Generate a fresh database id.
    fn generate_database_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Persist a document under `db_id`, replacing any previous one.
    async fn save(&self, db_id: &str, kg: &KgDocument) -> Result<(), StoreError>;

    /// Load the document stored under `db_id`.
    async fn load(&self, db_id: &str) -> Result<Option<KgDocument>, StoreError>;

    /// Delete the document stored under `db_id`. Returns whether one existed.
    async fn delete(&self, db_id: &str) -> Result<bool, StoreError>;

    /// List stored database ids in sorted order.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

/// Create a storage backend.
pub fn create_store(
    backend: StoreBackend,
    dir: impl AsRef<Path>,
) -> Result<Arc<dyn KgStore>, StoreError> {
    match backend {
        StoreBackend::File => Ok(Arc::new(FileKgStore::new(dir)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryKgStore::new())),
    }
}

/// Ids become file names, so they are restricted to a safe alphabet.
fn check_id(db_id: &str) -> Result<(), StoreError> {
    let valid = !db_id.is_empty()
        && db_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(db_id.to_string()))
    }
}

/// On-disk record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredKg {
    db_id: String,
    kg_data: KgDocument,
    saved_at: DateTime<Utc>,
}

/// File storage, one JSON file per database.
pub struct FileKgStore {
    dir: PathBuf,
}

impl FileKgStore {
    /// Create a file store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, db_id: &str) -> Result<PathBuf, StoreError> {
        check_id(db_id)?;
        Ok(self.dir.join(format!("{}.json", db_id)))
    }
}

#[async_trait]
impl KgStore for FileKgStore {
    async fn save(&self, db_id: &str, kg: &KgDocument) -> Result<(), StoreError> {
        let path = self.path_for(db_id)?;
        let record = StoredKg {
            db_id: db_id.to_string(),
            kg_data: kg.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(&path, json).await?;

        tracing::debug!(db_id = %db_id, path = %path.display(), "Saved knowledge graph");
        Ok(())
    }

    async fn load(&self, db_id: &str) -> Result<Option<KgDocument>, StoreError> {
        let path = self.path_for(db_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: StoredKg = serde_json::from_str(&content)?;
        Ok(Some(record.kg_data))
    }

    async fn delete(&self, db_id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(db_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(db_id = %db_id, "Deleted knowledge graph");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory storage for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryKgStore {
    documents: RwLock<BTreeMap<String, KgDocument>>,
}

impl MemoryKgStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl KgStore for MemoryKgStore {
    async fn save(&self, db_id: &str, kg: &KgDocument) -> Result<(), StoreError> {
        check_id(db_id)?;
        let mut documents = self.documents.write().map_err(lock_error)?;
        documents.insert(db_id.to_string(), kg.clone());
        Ok(())
    }

    async fn load(&self, db_id: &str) -> Result<Option<KgDocument>, StoreError> {
        let documents = self.documents.read().map_err(lock_error)?;
        Ok(documents.get(db_id).cloned())
    }

    async fn delete(&self, db_id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().map_err(lock_error)?;
        Ok(documents.remove(db_id).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let documents = self.documents.read().map_err(lock_error)?;
        Ok(documents.keys().cloned().collect())
    }
}
