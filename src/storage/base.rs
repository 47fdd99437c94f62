use crate::parser::CharacterAttributes;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Character {0} is not stored")]
    MissingCharacter(String),
    #[error("Character {0} is already monitored")]
    DuplicateMonitor(String),
    #[error("Storage operation error: {0}")]
    Operation(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Operation(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Serialization(error.to_string())
    }
}

/// A character as kept in the store, keyed by `attributes.name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(flatten)]
    pub attributes: CharacterAttributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CharacterRecord {
    pub fn new(attributes: CharacterAttributes) -> Self {
        let now = Utc::now();
        Self {
            attributes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    /// Replaces the scraped values, keeping the creation time.
    pub fn refresh(&mut self, attributes: CharacterAttributes) {
        self.attributes = attributes;
        self.updated_at = Utc::now();
    }
}

/// Marker enabling the bedmage login timer for a stored character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredCharacter {
    pub id: Uuid,
    pub character_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MonitoredCharacter {
    pub fn new(character_name: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            character_name: character_name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Inserts or refreshes the character named `attributes.name`.
    async fn upsert_character(&self, attributes: CharacterAttributes)
        -> StorageResult<CharacterRecord>;

    async fn find_character(&self, name: &str) -> StorageResult<Option<CharacterRecord>>;

    async fn list_character_names(&self) -> StorageResult<Vec<String>>;

    /// Fails with `MissingCharacter` unless the character is stored and with
    /// `DuplicateMonitor` if a marker already exists.
    async fn insert_monitor(&self, character_name: &str) -> StorageResult<MonitoredCharacter>;

    async fn find_monitor(&self, character_name: &str)
        -> StorageResult<Option<MonitoredCharacter>>;

    async fn list_monitors(&self) -> StorageResult<Vec<MonitoredCharacter>>;
}
