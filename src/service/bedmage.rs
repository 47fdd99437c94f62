use super::{AddCharacterOutcome, CharacterService, LoginTimer};
use crate::storage::{MonitoredCharacter, StorageError};
use crate::ScraperResult;
use chrono::NaiveDateTime;
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AddMonitorOutcome {
    Added(MonitoredCharacter),
    AlreadyMonitored(MonitoredCharacter),
    CharacterNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerOutcome {
    Ready(LoginTimer),
    NotMonitored,
    /// Monitored, but the profile is gone or has no last login.
    Unavailable,
}

/// Bedmage monitors: characters whose login cooldown is tracked.
pub struct BedmageService {
    characters: Arc<CharacterService>,
}

impl BedmageService {
    pub fn new(characters: Arc<CharacterService>) -> Self {
        Self { characters }
    }

    /// Monitors `name`, scraping and storing the character first when needed.
    pub async fn add_monitor(&self, name: &str) -> ScraperResult<AddMonitorOutcome> {
        let store = self.characters.store();

        let character_name = match store.find_character(name).await? {
            Some(record) => record.attributes.name,
            None => match self.characters.add_character(name).await? {
                AddCharacterOutcome::Added(record) | AddCharacterOutcome::AlreadyStored(record) => {
                    record.attributes.name
                }
                AddCharacterOutcome::NotFound => return Ok(AddMonitorOutcome::CharacterNotFound),
            },
        };

        if let Some(existing) = store.find_monitor(&character_name).await? {
            return Ok(AddMonitorOutcome::AlreadyMonitored(existing));
        }

        match store.insert_monitor(&character_name).await {
            Ok(monitor) => {
                info!("Monitoring {} for bedmage", character_name);
                Ok(AddMonitorOutcome::Added(monitor))
            }
            Err(StorageError::DuplicateMonitor(_)) => match store.find_monitor(&character_name).await? {
                Some(existing) => Ok(AddMonitorOutcome::AlreadyMonitored(existing)),
                None => Err(StorageError::DuplicateMonitor(character_name).into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn monitors(&self) -> ScraperResult<Vec<MonitoredCharacter>> {
        Ok(self.characters.store().list_monitors().await?)
    }

    /// The monitor is matched on the scraped name, as `add_monitor` stores it.
    pub async fn timer(&self, name: &str, now: NaiveDateTime) -> ScraperResult<TimerOutcome> {
        let store = self.characters.store();
        let Some(attributes) = self.characters.client().get_character_attributes(name).await? else {
            return Ok(match store.find_monitor(name).await? {
                Some(_) => TimerOutcome::Unavailable,
                None => TimerOutcome::NotMonitored,
            });
        };

        if store.find_monitor(&attributes.name).await?.is_none() {
            return Ok(TimerOutcome::NotMonitored);
        }

        Ok(match self.characters.timer_for(attributes, now) {
            Some(timer) => TimerOutcome::Ready(timer),
            None => TimerOutcome::Unavailable,
        })
    }
}
