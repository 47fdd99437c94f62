#[cfg(feature = "mongodb")]
use super::MongoStore;
use super::{CharacterStore, DiskStore, MemoryStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_STORE_PATH: &str = "data/characters.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageType {
    Memory,
    Disk {
        path: PathBuf,
    },
    #[cfg(feature = "mongodb")]
    Mongo {
        connection_string: String,
        database: String,
    },
}

impl Default for StorageType {
    fn default() -> Self {
        StorageType::Disk {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

pub async fn create_store(storage_type: &StorageType) -> StorageResult<Arc<dyn CharacterStore>> {
    match storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageType::Disk { path } => Ok(Arc::new(DiskStore::new(path)?)),
        #[cfg(feature = "mongodb")]
        StorageType::Mongo {
            connection_string,
            database,
        } => Ok(Arc::new(
            MongoStore::new(connection_string, database).await?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage_type = StorageType::Disk {
            path: dir.path().join("characters.json"),
        };

        let store = create_store(&storage_type).await.unwrap();
        assert!(store.list_character_names().await.unwrap().is_empty());
    }

    #[test]
    fn test_storage_type_from_json() {
        let disk: StorageType =
            serde_json::from_str(r#"{"type": "disk", "path": "/tmp/chars.json"}"#).unwrap();
        assert_eq!(
            disk,
            StorageType::Disk {
                path: PathBuf::from("/tmp/chars.json")
            }
        );
        let memory: StorageType = serde_json::from_str(r#"{"type": "memory"}"#).unwrap();
        assert_eq!(memory, StorageType::Memory);
    }
}
