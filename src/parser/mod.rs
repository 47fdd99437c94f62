//! Extraction engine for Tibiantis pages.
//!
//! Every extractor is a pure function over an already parsed [`Html`]
//! document. Absent values, empty listings and hard failures are kept
//! apart: extractors return `Option`/`Vec`, only [`parse_document`] fails.

pub mod character;
pub mod datetime;
pub mod deaths;
pub mod killers;
pub mod roster;

use crate::{ScraperError, ScraperResult};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub use character::{extract_character, parse_level, CharacterAttributes, ProfileField};
pub use datetime::{parse_datetime, TimezoneOffsets};
pub use deaths::{extract_deaths, DeathRecord};
pub use killers::parse_killers;
pub use roster::extract_online_roster;

pub(crate) static PROFILE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr.hover"));
pub(crate) static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
pub(crate) static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
pub(crate) static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// Parses a fetched payload into a document tree.
///
/// The HTML parser itself accepts anything, so a payload counts as
/// unparseable when it is blank or carries no markup at all.
pub fn parse_document(body: &str) -> ScraperResult<Html> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ScraperError::Processing("empty payload".to_string()));
    }
    if !trimmed.contains('<') {
        return Err(ScraperError::Processing(
            "payload does not contain any markup".to_string(),
        ));
    }
    Ok(Html::parse_document(body))
}

/// Concatenated, trimmed text of an element and its descendants.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&CELL).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_rejects_blank_payload() {
        let err = parse_document("   \n ").unwrap_err();
        assert!(err.is_processing());
    }

    #[test]
    fn test_parse_document_rejects_plain_text() {
        let err = parse_document("Invalid HTML").unwrap_err();
        assert!(err.is_processing());
    }

    #[test]
    fn test_parse_document_accepts_fragment() {
        let document = parse_document("<table><tr class=\"hover\"><td> a </td></tr></table>").unwrap();
        let row = document.select(&PROFILE_ROW).next().unwrap();
        let cells = cells(row);
        assert_eq!(cells.len(), 1);
        assert_eq!(element_text(cells[0]), "a");
    }
}
