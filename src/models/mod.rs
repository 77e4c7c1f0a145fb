pub mod checklist;
pub mod drive;
pub mod lodge;
pub mod settings;
pub mod sighting;
pub mod species;
pub mod strava_account;
pub mod user;
