use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use super::TrackPoint;

/// Append freshly captured points to a stored route.
///
/// Order is the caller's: nothing is sorted or de-duplicated.
pub fn append_points<I>(mut stored: Vec<TrackPoint>, fresh: I) -> Vec<TrackPoint>
where
    I: IntoIterator<Item = TrackPoint>,
{
    stored.extend(fresh);
    stored
}

/// Start and end instants of a complete route, taken from its first and last points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSpan {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl RouteSpan {
    pub fn of(points: &[TrackPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        Some(Self {
            started_at: instant_or_now(&first.timestamp),
            ended_at: instant_or_now(&last.timestamp),
        })
    }
}

fn instant_or_now(timestamp: &str) -> DateTime<Utc> {
    parse_instant(timestamp).unwrap_or_else(|| {
        warn!("Unparseable route timestamp '{}', using current time", timestamp);
        Utc::now()
    })
}

/// RFC 3339, or a zoneless ISO-8601 date-time read as UTC.
fn parse_instant(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, timestamp: &str) -> TrackPoint {
        TrackPoint {
            lat,
            lng: 31.0,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_append_keeps_stored_then_fresh() {
        let stored = vec![point(1.0, "a"), point(2.0, "b")];
        let fresh = vec![point(3.0, "c"), point(4.0, "d")];

        let merged = append_points(stored, fresh);
        let lats: Vec<f64> = merged.iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append_does_not_sort_or_dedupe() {
        let stored = vec![point(1.0, "2024-01-01T10:05:00Z")];
        let fresh = vec![
            point(1.0, "2024-01-01T10:05:00Z"),
            point(0.5, "2024-01-01T10:00:00Z"),
        ];

        let merged = append_points(stored, fresh);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], merged[1]);
        assert_eq!(merged[2].lat, 0.5);
    }

    #[test]
    fn test_append_to_empty_route() {
        let merged = append_points(Vec::new(), vec![point(7.0, "x")]);
        assert_eq!(merged, vec![point(7.0, "x")]);
        assert!(append_points(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_span_from_first_and_last() {
        let points = vec![
            point(1.0, "2024-01-01T10:00:00Z"),
            point(2.0, "2024-01-01T10:30:00Z"),
            point(3.0, "2024-01-01T12:15:00+02:00"),
        ];
        let span = RouteSpan::of(&points).unwrap();
        assert_eq!(span.started_at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(span.ended_at.to_rfc3339(), "2024-01-01T10:15:00+00:00");
    }

    #[test]
    fn test_span_reads_zoneless_times_as_utc() {
        let points = vec![
            point(1.0, "2024-01-01T10:00:00"),
            point(2.0, "2024-01-01T11:45:30.250"),
        ];
        let span = RouteSpan::of(&points).unwrap();
        assert_eq!(span.started_at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(span.ended_at.to_rfc3339(), "2024-01-01T11:45:30.250+00:00");
    }

    #[test]
    fn test_span_falls_back_to_now() {
        let before = Utc::now();
        let span = RouteSpan::of(&[point(1.0, "not a time")]).unwrap();
        assert!(span.started_at >= before);
        assert!(span.ended_at >= span.started_at);
    }

    #[test]
    fn test_span_of_empty_route() {
        assert_eq!(RouteSpan::of(&[]), None);
    }
}
