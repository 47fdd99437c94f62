use super::base::{
    CharacterRecord, CharacterStore, MonitoredCharacter, StorageError, StorageResult,
};
use super::memory::StoreState;
use crate::parser::CharacterAttributes;
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store persisted as a single pretty-printed JSON snapshot.
///
/// Every mutation is applied to a copy of the state, written to a sibling
/// temp file and renamed into place; the copy replaces the live state only
/// once it is on disk. Writers are serialized by `write_gate`.
#[derive(Clone)]
pub struct DiskStore {
    path: PathBuf,
    state: Arc<RwLock<StoreState>>,
    write_gate: Arc<Mutex<()>>,
}

impl DiskStore {
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let state: StoreState = serde_json::from_str(&raw)?;
            info!("Loaded character store from {}", path.display());
            state
        } else {
            StoreState::default()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` to a copy of the state, persists the copy and only
    /// then publishes it. A failed write leaves the live state untouched.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut StoreState) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let _gate = self.write_gate.lock().await;

        let mut next = self.state.read().clone();
        let value = mutate(&mut next)?;
        let json = serde_json::to_string_pretty(&next)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &json))
            .await
            .map_err(|e| StorageError::Operation(format!("snapshot writer failed: {e}")))??;

        *self.state.write() = next;
        Ok(value)
    }
}

fn write_snapshot(path: &Path, json: &str) -> StorageResult<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    debug!("Saved character store to {}", path.display());
    Ok(())
}

#[async_trait]
impl CharacterStore for DiskStore {
    async fn upsert_character(
        &self,
        attributes: CharacterAttributes,
    ) -> StorageResult<CharacterRecord> {
        self.commit(|state| Ok(state.upsert_character(attributes)))
            .await
    }

    async fn find_character(&self, name: &str) -> StorageResult<Option<CharacterRecord>> {
        Ok(self.state.read().find_character(name))
    }

    async fn list_character_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.state.read().character_names())
    }

    async fn insert_monitor(&self, character_name: &str) -> StorageResult<MonitoredCharacter> {
        self.commit(|state| state.insert_monitor(character_name))
            .await
    }

    async fn find_monitor(
        &self,
        character_name: &str,
    ) -> StorageResult<Option<MonitoredCharacter>> {
        Ok(self.state.read().find_monitor(character_name))
    }

    async fn list_monitors(&self) -> StorageResult<Vec<MonitoredCharacter>> {
        Ok(self.state.read().monitors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("characters.json");

        let store = DiskStore::new(&path).unwrap();
        store
            .upsert_character(CharacterAttributes {
                name: "Persisted".to_string(),
                level: Some(42),
                last_login: NaiveDate::from_ymd_opt(2023, 5, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0),
                ..Default::default()
            })
            .await
            .unwrap();
        store.insert_monitor("Persisted").await.unwrap();

        let reopened = DiskStore::new(&path).unwrap();
        let record = reopened.find_character("Persisted").await.unwrap().unwrap();
        assert_eq!(record.attributes.level, Some(42));
        assert_eq!(
            record.attributes.last_login,
            NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
        );
        assert_eq!(reopened.list_monitors().await.unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("characters.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            DiskStore::new(&path),
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("characters.json");
        let store = DiskStore::new(&path).unwrap();
        store
            .upsert_character(CharacterAttributes {
                name: "Kept".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // A directory in the temp file's place makes every write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let result = store
            .upsert_character(CharacterAttributes {
                name: "Lost".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(StorageError::Operation(_))));
        assert!(store.find_character("Lost").await.unwrap().is_none());
        assert!(store.insert_monitor("Kept").await.is_err());
        assert!(store.find_monitor("Kept").await.unwrap().is_none());
        assert_eq!(store.list_character_names().await.unwrap(), vec!["Kept"]);

        fs::remove_dir(path.with_extension("json.tmp")).unwrap();
        let reopened = DiskStore::new(&path).unwrap();
        assert!(reopened.find_character("Lost").await.unwrap().is_none());
        assert!(reopened.find_character("Kept").await.unwrap().is_some());
    }
}
