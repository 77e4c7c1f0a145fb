//! Lenient GPX track-log reader.
//!
//! Points are pulled out with patterns rather than a full XML parse, so files
//! with broken metadata or stray markup still import as long as enough
//! `<trkpt>` elements carry usable coordinates.

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{ParsedTrack, TrackError, TrackPoint, MIN_TRACK_POINTS};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<name\b[^>]*>([^<]+)</name\s*>").expect("name pattern"));

// Paired `<trkpt ...>...</trkpt>` or self-closing `<trkpt .../>`.
static TRKPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<trkpt\b([^>]*?)(?:/>|>(.*?)</trkpt\s*>)").expect("trkpt pattern")
});

// Attribute names must start after whitespace, so `data-lat` or `ext:lat` never match.
static COORD_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(lat|lon)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("coordinate pattern")
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<time\b[^>]*>([^<]*)</time\s*>").expect("time pattern"));

/// Parse a GPX document into its track points and optional name.
///
/// Points with a non-numeric `lat` or `lon` are dropped. Points without a
/// `<time>` are stamped with the current time.
pub fn parse_gpx(document: &str) -> Result<ParsedTrack, TrackError> {
    let name = first_text(&NAME_RE, document);
    let parsed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for caps in TRKPT_RE.captures_iter(document) {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let inner = caps.get(2).map_or("", |m| m.as_str());

        let Some((lat, lng)) = coordinates(attrs) else {
            skipped += 1;
            continue;
        };

        let timestamp = first_text(&TIME_RE, inner).unwrap_or_else(|| parsed_at.clone());
        points.push(TrackPoint {
            lat,
            lng,
            timestamp,
        });
    }

    if skipped > 0 {
        debug!("Skipped {} track points with unusable coordinates", skipped);
    }

    if points.len() < MIN_TRACK_POINTS {
        return Err(TrackError::InsufficientPoints {
            found: points.len(),
        });
    }

    Ok(ParsedTrack { points, name })
}

/// Trimmed text of the first element matched by `re` that isn't blank.
fn first_text(re: &Regex, haystack: &str) -> Option<String> {
    re.captures_iter(haystack).find_map(|caps| {
        let text = caps.get(1)?.as_str().trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn coordinates(attrs: &str) -> Option<(f64, f64)> {
    let mut lat = None;
    let mut lon = None;

    for caps in COORD_ATTR_RE.captures_iter(attrs) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        let slot = if caps[1].eq_ignore_ascii_case("lat") {
            &mut lat
        } else {
            &mut lon
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Some((parse_coordinate(lat?)?, parse_coordinate(lon?)?))
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <metadata>
    <name>  Morning drive, Sabi Sand  </name>
  </metadata>
  <trk>
    <trkseg>
      <trkpt lat="-24.25" lon="31.15"></trkpt>
      <trkpt lat="-24.26" lon="31.16">
        <ele>312</ele>
        <time>2024-01-01T10:00:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_parse_gpx_basic() {
        let before = Utc::now();
        let track = parse_gpx(SAMPLE_GPX).unwrap();
        let after = Utc::now();

        assert_eq!(track.points.len(), 2);
        assert_eq!(track.points[0].lat, -24.25);
        assert_eq!(track.points[0].lng, 31.15);
        assert_eq!(track.points[1].lat, -24.26);
        assert_eq!(track.points[1].lng, 31.16);
        assert_eq!(track.points[1].timestamp, "2024-01-01T10:00:00Z");

        // First point had no <time>, so it carries the parse time.
        let stamped = DateTime::parse_from_rfc3339(&track.points[0].timestamp).unwrap();
        let stamped = stamped.with_timezone(&Utc);
        assert!(stamped >= before - chrono::Duration::milliseconds(1));
        assert!(stamped <= after + chrono::Duration::milliseconds(1));
    }

    #[test]
    fn test_name_is_trimmed() {
        let track = parse_gpx(SAMPLE_GPX).unwrap();
        assert_eq!(track.name.as_deref(), Some("Morning drive, Sabi Sand"));
    }

    #[test]
    fn test_name_absent() {
        let doc = r#"<gpx><trk><trkseg>
            <trkpt lat="1" lon="2"><time>a</time></trkpt>
            <trkpt lat="3" lon="4"><time>b</time></trkpt>
        </trkseg></trk></gpx>"#;
        assert_eq!(parse_gpx(doc).unwrap().name, None);
    }

    #[test]
    fn test_points_keep_document_order() {
        let doc = r#"<gpx><trk><trkseg>
            <trkpt lat="3" lon="30"><time>2024-01-01T10:02:00Z</time></trkpt>
            <trkpt lat="1" lon="10"><time>2024-01-01T10:00:00Z</time></trkpt>
            <trkpt lat="2" lon="20"><time>2024-01-01T10:01:00Z</time></trkpt>
            <trkpt lat="2" lon="20"><time>2024-01-01T10:01:00Z</time></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(doc).unwrap();
        let lats: Vec<f64> = track.points.iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![3.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_prefixed_attributes_are_not_coordinates() {
        let doc = r#"<gpx><trk><trkseg>
            <trkpt data-lat="x" lat="1" ext:lon='y' lon="2"></trkpt>
            <trkpt lat="3" lon="4"></trkpt>
            <trkpt lat="5" lon="6"/>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert_eq!(track.points.len(), 3);
        assert_eq!(track.points[0].lat, 1.0);
        assert_eq!(track.points[0].lng, 2.0);
    }

    #[test]
    fn test_empty_name_elements_are_skipped() {
        let doc = r#"<gpx><metadata><name></name></metadata>
            <trk><name> </name><name>Loop</name><trkseg>
            <trkpt lat="1" lon="2"></trkpt>
            <trkpt lat="3" lon="4"></trkpt>
        </trkseg></trk></gpx>"#;
        assert_eq!(parse_gpx(doc).unwrap().name.as_deref(), Some("Loop"));
    }

    #[test]
    fn test_non_numeric_point_is_skipped_and_not_counted() {
        let doc = r#"<gpx><trk><trkseg>
            <trkpt lat="-24.25" lon="31.15"></trkpt>
            <trkpt lat="abc" lon="31.16"></trkpt>
        </trkseg></trk></gpx>"#;
        assert_eq!(
            parse_gpx(doc),
            Err(TrackError::InsufficientPoints { found: 1 })
        );
    }

    #[test]
    fn test_malformed_points_dropped_from_result() {
        let doc = r#"<gpx><trk><trkseg>
            <trkpt lat="-24.25" lon="31.15"></trkpt>
            <trkpt lat="-24.30" lon="east"></trkpt>
            <trkpt lat="NaN" lon="31.20"></trkpt>
            <trkpt lon="31.21"></trkpt>
            <trkpt lat="-24.26" lon="31.16"></trkpt>
        </trkseg></trk></gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert_eq!(track.points.len(), 2);
        assert_eq!(track.points[1].lat, -24.26);
    }

    #[test]
    fn test_empty_document_fails() {
        let err = parse_gpx("").unwrap_err();
        assert_eq!(err, TrackError::InsufficientPoints { found: 0 });
        assert_eq!(
            err.to_string(),
            "document must contain at least 2 track points"
        );
    }

    #[test]
    fn test_single_point_fails() {
        let doc = r#"<gpx><trkpt lat="1" lon="2"><time>t</time></trkpt></gpx>"#;
        assert!(matches!(
            parse_gpx(doc),
            Err(TrackError::InsufficientPoints { found: 1 })
        ));
    }

    #[test]
    fn test_attribute_order_and_quotes_are_free() {
        let doc = r#"<gpx>
            <trkpt lon='31.15' lat='-24.25'/>
            <TRKPT LAT="-24.26" LON="31.16" ele="300"><TIME>2024-01-01T10:00:00Z</TIME></TRKPT>
        </gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert_eq!(track.points[0].lat, -24.25);
        assert_eq!(track.points[0].lng, 31.15);
        assert_eq!(track.points[1].timestamp, "2024-01-01T10:00:00Z");
    }

    #[test]
    fn test_no_range_validation() {
        let doc = r#"<gpx>
            <trkpt lat="123.5" lon="-400"></trkpt>
            <trkpt lat="0" lon="0"></trkpt>
        </gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert_eq!(track.points[0].lat, 123.5);
        assert_eq!(track.points[0].lng, -400.0);
    }

    #[test]
    fn test_blank_time_uses_parse_time() {
        let doc = r#"<gpx>
            <trkpt lat="1" lon="2"><time>   </time></trkpt>
            <trkpt lat="3" lon="4"><time> 2024-05-05T05:05:05Z </time></trkpt>
        </gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert!(!track.points[0].timestamp.is_empty());
        assert!(DateTime::parse_from_rfc3339(&track.points[0].timestamp).is_ok());
        assert_eq!(track.points[1].timestamp, "2024-05-05T05:05:05Z");
    }

    #[test]
    fn test_trailing_junk_coordinate_is_skipped() {
        assert_eq!(parse_coordinate(" -24.25 "), Some(-24.25));
        assert_eq!(parse_coordinate("-24.25abc"), None);
        assert_eq!(parse_coordinate("31.5,"), None);
        assert_eq!(parse_coordinate("inf"), None);
    }

    #[test]
    fn test_track_points_nested_name_ignored_for_time() {
        let doc = r#"<gpx>
            <trk><name>Evening loop</name>
            <trkseg>
                <trkpt lat="1" lon="2"><name>wp</name></trkpt>
                <trkpt lat="3" lon="4"></trkpt>
            </trkseg></trk>
        </gpx>"#;
        let track = parse_gpx(doc).unwrap();
        assert_eq!(track.name.as_deref(), Some("Evening loop"));
        assert_eq!(track.points.len(), 2);
    }
}
