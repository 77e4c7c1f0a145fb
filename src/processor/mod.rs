pub mod catalog_processor;
pub mod checklist_processor;
pub mod drive_processor;
pub mod roads_processor;
pub mod settings_processor;
pub mod sighting_processor;
pub mod strava_processor;
pub mod user_processor;
