use super::TibiantisClient;
use crate::parser::CharacterAttributes;
use crate::storage::{CharacterRecord, CharacterStore};
use crate::core::config::MAX_LOGIN_COOLDOWN_MINUTES;
use crate::{ScraperConfig, ScraperError, ScraperResult};
use chrono::{Duration, Local, NaiveDateTime};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AddCharacterOutcome {
    Added(CharacterRecord),
    AlreadyStored(CharacterRecord),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFailure {
    pub name: String,
    pub reason: String,
}

/// Summary of one roster ingest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub total_online: usize,
    pub already_stored: usize,
    pub new_characters: usize,
    pub added: usize,
    pub failed: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    fn record_failure(&mut self, name: String, reason: String) {
        warn!("Failed to add {}: {}", name, reason);
        self.failed += 1;
        self.failures.push(IngestFailure { name, reason });
    }
}

/// Time elapsed since a character's last login, against the bedmage cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginTimer {
    #[serde(flatten)]
    pub attributes: CharacterAttributes,
    pub minutes_since_last_login: i64,
    pub can_login: bool,
}

impl LoginTimer {
    /// `None` when the attributes carry no usable last login.
    pub fn compute(
        attributes: CharacterAttributes,
        now: NaiveDateTime,
        cooldown: Duration,
    ) -> Option<Self> {
        let elapsed = now.signed_duration_since(attributes.last_login?);
        Some(Self {
            minutes_since_last_login: elapsed.num_minutes(),
            can_login: elapsed >= cooldown,
            attributes,
        })
    }
}

pub struct CharacterService {
    client: TibiantisClient,
    store: Arc<dyn CharacterStore>,
    ingest_concurrency: usize,
    login_cooldown: Duration,
}

impl CharacterService {
    pub fn new(
        client: TibiantisClient,
        store: Arc<dyn CharacterStore>,
        config: &ScraperConfig,
    ) -> Self {
        Self {
            client,
            store,
            ingest_concurrency: config.ingest_concurrency.max(1),
            login_cooldown: Duration::minutes(
                config
                    .login_cooldown_minutes
                    .clamp(0, MAX_LOGIN_COOLDOWN_MINUTES),
            ),
        }
    }

    pub fn client(&self) -> &TibiantisClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn CharacterStore> {
        &self.store
    }

    /// Scrapes `name` and stores it unless a record under the scraped
    /// name already exists.
    pub async fn add_character(&self, name: &str) -> ScraperResult<AddCharacterOutcome> {
        let Some(attributes) = self.client.get_character_attributes(name).await? else {
            return Ok(AddCharacterOutcome::NotFound);
        };

        if let Some(existing) = self.store.find_character(&attributes.name).await? {
            return Ok(AddCharacterOutcome::AlreadyStored(existing));
        }

        let record = self.store.upsert_character(attributes).await?;
        info!("Stored character {}", record.name());
        Ok(AddCharacterOutcome::Added(record))
    }

    pub async fn stored_character_names(&self) -> ScraperResult<Vec<String>> {
        Ok(self.store.list_character_names().await?)
    }

    /// Adds every online character that is not stored yet.
    ///
    /// Roster duplicates are looked up once. Per-character failures are
    /// collected in the report; only a missing roster fails the whole pass.
    pub async fn add_new_online_characters(&self) -> ScraperResult<IngestReport> {
        let roster = self.client.get_online_roster().await?.ok_or_else(|| {
            ScraperError::Processing("online roster table not found".to_string())
        })?;
        let stored: HashSet<String> = self.stored_character_names().await?.into_iter().collect();

        let mut report = IngestReport {
            total_online: roster.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let mut new_names = Vec::new();
        for name in roster {
            if !seen.insert(name.clone()) {
                continue;
            }
            if stored.contains(&name) {
                report.already_stored += 1;
            } else {
                new_names.push(name);
            }
        }
        report.new_characters = new_names.len();
        info!(
            "{} online, {} already stored, {} new",
            report.total_online, report.already_stored, report.new_characters
        );

        let outcomes: Vec<_> = stream::iter(new_names)
            .map(|name| async move {
                let outcome = self.add_character(&name).await;
                (name, outcome)
            })
            .buffered(self.ingest_concurrency)
            .collect()
            .await;

        for (name, outcome) in outcomes {
            match outcome {
                Ok(AddCharacterOutcome::Added(_)) => report.added += 1,
                Ok(AddCharacterOutcome::AlreadyStored(_)) => {
                    report.record_failure(name, "character is already stored".to_string())
                }
                Ok(AddCharacterOutcome::NotFound) => {
                    report.record_failure(name, "character does not exist on the server".to_string())
                }
                Err(e) => report.record_failure(name, e.to_string()),
            }
        }

        info!("Ingest finished: {} added, {} failed", report.added, report.failed);
        Ok(report)
    }

    /// Measures already scraped attributes against the configured cooldown.
    pub fn timer_for(&self, attributes: CharacterAttributes, now: NaiveDateTime) -> Option<LoginTimer> {
        LoginTimer::compute(attributes, now, self.login_cooldown)
    }

    /// Scrapes `name` fresh and measures its last login against `now`.
    ///
    /// Both sides are naive wall-clock values; `now` is expected in the
    /// same local convention the date normalizer produces.
    pub async fn minutes_since_last_login(
        &self,
        name: &str,
        now: NaiveDateTime,
    ) -> ScraperResult<Option<LoginTimer>> {
        let Some(attributes) = self.client.get_character_attributes(name).await? else {
            return Ok(None);
        };
        let timer = self.timer_for(attributes, now);
        if timer.is_none() {
            warn!("Character {} has no usable last login", name);
        }
        Ok(timer)
    }

    /// [`Self::minutes_since_last_login`] against the local clock.
    pub async fn login_timer(&self, name: &str) -> ScraperResult<Option<LoginTimer>> {
        self.minutes_since_last_login(name, Local::now().naive_local())
            .await
    }
}
