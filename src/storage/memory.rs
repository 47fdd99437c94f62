use super::base::{
    CharacterRecord, CharacterStore, MonitoredCharacter, StorageError, StorageResult,
};
use crate::parser::CharacterAttributes;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Plain store contents, shared by the in-memory and the JSON file backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    characters: BTreeMap<String, CharacterRecord>,
    monitors: Vec<MonitoredCharacter>,
}

impl StoreState {
    pub(crate) fn upsert_character(&mut self, attributes: CharacterAttributes) -> CharacterRecord {
        let record = match self.characters.remove(&attributes.name) {
            Some(mut existing) => {
                existing.refresh(attributes);
                existing
            }
            None => CharacterRecord::new(attributes),
        };
        self.characters
            .insert(record.name().to_string(), record.clone());
        record
    }

    pub(crate) fn find_character(&self, name: &str) -> Option<CharacterRecord> {
        self.characters.get(name).cloned()
    }

    pub(crate) fn character_names(&self) -> Vec<String> {
        self.characters.keys().cloned().collect()
    }

    pub(crate) fn insert_monitor(&mut self, character_name: &str) -> StorageResult<MonitoredCharacter> {
        if !self.characters.contains_key(character_name) {
            return Err(StorageError::MissingCharacter(character_name.to_string()));
        }
        if self.find_monitor(character_name).is_some() {
            return Err(StorageError::DuplicateMonitor(character_name.to_string()));
        }

        let monitor = MonitoredCharacter::new(character_name);
        self.monitors.push(monitor.clone());
        Ok(monitor)
    }

    pub(crate) fn find_monitor(&self, character_name: &str) -> Option<MonitoredCharacter> {
        self.monitors
            .iter()
            .find(|m| m.character_name == character_name)
            .cloned()
    }

    pub(crate) fn monitors(&self) -> Vec<MonitoredCharacter> {
        self.monitors.clone()
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn upsert_character(
        &self,
        attributes: CharacterAttributes,
    ) -> StorageResult<CharacterRecord> {
        Ok(self.state.write().upsert_character(attributes))
    }

    async fn find_character(&self, name: &str) -> StorageResult<Option<CharacterRecord>> {
        Ok(self.state.read().find_character(name))
    }

    async fn list_character_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.state.read().character_names())
    }

    async fn insert_monitor(&self, character_name: &str) -> StorageResult<MonitoredCharacter> {
        self.state.write().insert_monitor(character_name)
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
