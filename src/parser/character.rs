use super::{cells, element_text, parse_datetime, TimezoneOffsets, PROFILE_ROW};
use chrono::NaiveDateTime;
use log::{debug, warn};
use scraper::Html;
use serde::{Deserialize, Serialize};

/// Attributes read from a character's profile table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAttributes {
    pub name: String,
    pub sex: Option<String>,
    pub vocation: Option<String>,
    pub level: Option<u32>,
    pub world: Option<String>,
    pub residence: Option<String>,
    pub house: Option<String>,
    pub guild_membership: Option<String>,
    pub last_login: Option<NaiveDateTime>,
    pub comment: Option<String>,
    pub account_status: Option<String>,
}

/// Profile rows the extractor understands, keyed by their label cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Sex,
    Vocation,
    Level,
    World,
    Residence,
    House,
    GuildMembership,
    LastLogin,
    Comment,
    AccountStatus,
}

impl ProfileField {
    /// Looks up a raw label such as `"Guild Membership:"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let field = match normalize_label(label).as_str() {
            "name" => ProfileField::Name,
            "sex" => ProfileField::Sex,
            "vocation" => ProfileField::Vocation,
            "level" => ProfileField::Level,
            "world" => ProfileField::World,
            "residence" => ProfileField::Residence,
            "house" => ProfileField::House,
            "guild membership" => ProfileField::GuildMembership,
            "last login" => ProfileField::LastLogin,
            "comment" => ProfileField::Comment,
            "account status" => ProfileField::AccountStatus,
            _ => return None,
        };
        Some(field)
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().trim_end_matches(':').to_string()
}

/// Integer coercion for the level cell. Anything that is not a
/// non-negative integer is treated as missing.
pub fn parse_level(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(level) => Some(level),
        Err(e) => {
            warn!("Failed to convert level '{}' to int: {}", raw, e);
            None
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Builds the attribute record from the `tr.hover` rows of a profile page.
///
/// Returns `None` when the page has no profile rows or no name row, which is
/// how the site renders an unknown character. Bad individual values only
/// clear their own field.
pub fn extract_character(document: &Html, offsets: &TimezoneOffsets) -> Option<CharacterAttributes> {
    let mut rows = document.select(&PROFILE_ROW).peekable();
    if rows.peek().is_none() {
        debug!("No profile rows found");
        return None;
    }

    let mut name = None;
    let mut attributes = CharacterAttributes::default();

    for row in rows {
        let cells = cells(row);
        if cells.len() < 2 {
            continue;
        }

        let Some(field) = ProfileField::from_label(&element_text(cells[0])) else {
            continue;
        };
        let value = element_text(cells[1]);

        match field {
            ProfileField::Name => name = non_empty(value),
            ProfileField::Sex => attributes.sex = non_empty(value),
            ProfileField::Vocation => attributes.vocation = non_empty(value),
            ProfileField::Level => attributes.level = parse_level(&value),
            ProfileField::World => attributes.world = non_empty(value),
            ProfileField::Residence => attributes.residence = non_empty(value),
            ProfileField::House => attributes.house = non_empty(value),
            ProfileField::GuildMembership => attributes.guild_membership = non_empty(value),
            ProfileField::LastLogin => attributes.last_login = parse_datetime(&value, offsets),
            ProfileField::Comment => attributes.comment = non_empty(value),
            ProfileField::AccountStatus => attributes.account_status = non_empty(value),
        }
    }

    match name {
        Some(name) => Some(CharacterAttributes { name, ..attributes }),
        None => {
            debug!("Profile rows present but no name row");
            None
        }
    }
}
