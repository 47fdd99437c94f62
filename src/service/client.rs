use crate::parser::{
    extract_character, extract_deaths, extract_online_roster, parse_document,
    CharacterAttributes, DeathRecord, TimezoneOffsets,
};
use crate::{Scraper, ScraperConfig, ScraperResult, StatsTracker};
use log::{debug, info};
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Engine entry point: fetches Tibiantis pages through the injected
/// transport and runs the matching extractor over them.
#[derive(Clone)]
pub struct TibiantisClient {
    scraper: Arc<dyn Scraper>,
    base_url: Url,
    roster_page: String,
    offsets: TimezoneOffsets,
    roster_header_rows: usize,
}

impl TibiantisClient {
    pub fn new(scraper: Arc<dyn Scraper>, config: &ScraperConfig) -> Self {
        Self {
            scraper,
            base_url: config.base_url.clone(),
            roster_page: config.roster_page.clone(),
            offsets: config.timezone_offsets.clone(),
            roster_header_rows: config.roster_header_rows,
        }
    }

    pub fn character_url(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", "character")
            .append_pair("name", name);
        url
    }

    pub fn roster_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &self.roster_page);
        url
    }

    pub fn stats(&self) -> &StatsTracker {
        self.scraper.stats()
    }

    /// Fetches `url` and hands the parsed document to `extract`. The document
    /// never outlives this call.
    async fn fetch_and_extract<T>(
        &self,
        url: Url,
        extract: impl FnOnce(&Html) -> T,
    ) -> ScraperResult<T> {
        let response = self.scraper.fetch(url).await?;
        let document = parse_document(&response.body)?;
        Ok(extract(&document))
    }

    /// `Ok(None)` when the profile page does not describe a character.
    pub async fn get_character_attributes(
        &self,
        name: &str,
    ) -> ScraperResult<Option<CharacterAttributes>> {
        let offsets = &self.offsets;
        let attributes = self
            .fetch_and_extract(self.character_url(name), |document| {
                extract_character(document, offsets)
            })
            .await?;

        match &attributes {
            Some(found) => debug!("Extracted attributes for {}", found.name),
            None => info!("Character {} not found", name),
        }
        Ok(attributes)
    }

    /// `Ok(None)` when the character is unknown, `Ok(Some(vec![]))` when it
    /// exists but has no recorded deaths.
    pub async fn get_character_deaths(
        &self,
        name: &str,
    ) -> ScraperResult<Option<Vec<DeathRecord>>> {
        let offsets = &self.offsets;
        let deaths = self
            .fetch_and_extract(self.character_url(name), |document| {
                extract_character(document, offsets).map(|_| extract_deaths(document, offsets))
            })
            .await?;

        match &deaths {
            Some(deaths) => debug!("Extracted {} deaths for {}", deaths.len(), name),
            None => info!("Character {} not found", name),
        }
        Ok(deaths)
    }

    /// `Ok(None)` when the listing table is missing from the page.
    pub async fn get_online_roster(&self) -> ScraperResult<Option<Vec<String>>> {
        let header_rows = self.roster_header_rows;
        let roster = self
            .fetch_and_extract(self.roster_url(), |document| {
                extract_online_roster(document, header_rows)
            })
            .await?;

        if let Some(names) = &roster {
            info!("{} characters online", names.len());
        }
        Ok(roster)
    }
}
