use super::{
    cells, element_text, parse_datetime, parse_killers, TimezoneOffsets, PROFILE_ROW, TABLE,
};
use chrono::NaiveDateTime;
use log::{debug, warn};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

pub const LATEST_DEATHS_MARKER: &str = "Latest Deaths";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub date: Option<NaiveDateTime>,
    pub killed_by: String,
    pub killers: Vec<String>,
}

/// Reads the death history of a profile page, oldest row last as the site
/// prints it. A page without a usable table yields an empty list.
pub fn extract_deaths(document: &Html, offsets: &TimezoneOffsets) -> Vec<DeathRecord> {
    let Some(table) = find_death_table(document) else {
        debug!("No death table found");
        return Vec::new();
    };

    table
        .select(&PROFILE_ROW)
        .filter_map(|row| {
            let cells = cells(row);
            if cells.len() < 2 {
                return None;
            }

            let killed_by = element_text(cells[1]);
            let Some(killers) = parse_killers(&killed_by) else {
                warn!("Skipping death row without killer clause: '{}'", killed_by);
                return None;
            };

            Some(DeathRecord {
                date: parse_datetime(&element_text(cells[0]), offsets),
                killed_by,
                killers,
            })
        })
        .collect()
}

/// Picks the innermost table mentioning "Latest Deaths", else the first table
/// holding a profile row with at least two cells.
fn find_death_table(document: &Html) -> Option<ElementRef<'_>> {
    let tables: Vec<ElementRef<'_>> = document.select(&TABLE).collect();

    let marked: Vec<ElementRef<'_>> = tables
        .iter()
        .copied()
        .filter(|table| contains_marker(*table))
        .collect();
    let innermost = marked.iter().copied().find(|table| {
        !marked
            .iter()
            .any(|other| other.id() != table.id() && is_descendant(*other, *table))
    });
    if innermost.is_some() {
        return innermost;
    }

    tables.into_iter().find(|table| {
        table
            .select(&PROFILE_ROW)
            .any(|row| cells(row).len() >= 2)
    })
}

fn contains_marker(table: ElementRef<'_>) -> bool {
    table.text().collect::<String>().contains(LATEST_DEATHS_MARKER)
}

fn is_descendant(node: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    node.ancestors().any(|parent| parent.id() == ancestor.id())
}
