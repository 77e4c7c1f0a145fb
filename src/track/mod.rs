pub mod gpx;
pub mod route;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed track needs at least this many usable points to form a route.
pub const MIN_TRACK_POINTS: usize = 2;

/// One recorded position. `timestamp` is an ISO-8601 string kept as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrack {
    pub points: Vec<TrackPoint>,
    pub name: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("document must contain at least {} track points", MIN_TRACK_POINTS)]
    InsufficientPoints { found: usize },
}
