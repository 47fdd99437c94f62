//! Services over the extraction engine: character ingest and bedmage
//! login timers.

mod bedmage;
mod character;
mod client;

pub use bedmage::{AddMonitorOutcome, BedmageService, TimerOutcome};
pub use character::{
    AddCharacterOutcome, CharacterService, IngestFailure, IngestReport, LoginTimer,
};
pub use client::TibiantisClient;
