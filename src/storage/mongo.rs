use super::base::{
    CharacterRecord, CharacterStore, MonitoredCharacter, StorageError, StorageResult,
};
use crate::parser::CharacterAttributes;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

const CHARACTERS_COLLECTION: &str = "characters";
const MONITORS_COLLECTION: &str = "bedmage_monitors";

pub struct MongoStore {
    characters: Collection<CharacterRecord>,
    monitors: Collection<MonitoredCharacter>,
}

impl MongoStore {
    pub async fn new(connection_string: &str, database_name: &str) -> StorageResult<Self> {
        let client = Client::with_uri_str(connection_string).await?;
        let database = client.database(database_name);
        Ok(Self {
            characters: database.collection(CHARACTERS_COLLECTION),
            monitors: database.collection(MONITORS_COLLECTION),
        })
    }
}

impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        StorageError::Operation(err.to_string())
    }
}

#[async_trait]
impl CharacterStore for MongoStore {
    async fn upsert_character(
        &self,
        attributes: CharacterAttributes,
    ) -> StorageResult<CharacterRecord> {
        let record = match self.find_character(&attributes.name).await? {
            Some(mut existing) => {
                existing.refresh(attributes);
                existing
            }
            None => CharacterRecord::new(attributes),
        };

        self.characters
            .replace_one(doc! { "name": record.name() }, &record)
            .upsert(true)
            .await?;
        Ok(record)
    }

    async fn find_character(&self, name: &str) -> StorageResult<Option<CharacterRecord>> {
        Ok(self.characters.find_one(doc! { "name": name }).await?)
    }

    async fn list_character_names(&self) -> StorageResult<Vec<String>> {
        let records: Vec<CharacterRecord> = self.characters.find(doc! {}).await?.try_collect().await?;
        Ok(records
            .into_iter()
            .map(|record| record.attributes.name)
            .collect())
    }

    async fn insert_monitor(&self, character_name: &str) -> StorageResult<MonitoredCharacter> {
        if self.find_character(character_name).await?.is_none() {
            return Err(StorageError::MissingCharacter(character_name.to_string()));
        }
        if self.find_monitor(character_name).await?.is_some() {
            return Err(StorageError::DuplicateMonitor(character_name.to_string()));
        }

        let monitor = MonitoredCharacter::new(character_name);
        self.monitors.insert_one(&monitor).await?;
        Ok(monitor)
    }

    async fn find_monitor(
        &self,
        character_name: &str,
    ) -> StorageResult<Option<MonitoredCharacter>> {
        Ok(self
            .monitors
            .find_one(doc! { "character_name": character_name })
            .await?)
    }

    async fn list_monitors(&self) -> StorageResult<Vec<MonitoredCharacter>> {
        Ok(self.monitors.find(doc! {}).await?.try_collect().await?)
    }
}
