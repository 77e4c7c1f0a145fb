//! Strava OAuth and activity API client.

use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::drive::DrivePhoto;
use crate::track::TrackPoint;

pub const STRAVA_AUTH_URL: &str = "https://www.strava.com/oauth/authorize";
pub const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
pub const STRAVA_SCOPE: &str = "activity:read_all";

/// Tokens closer than this to expiry are refreshed before use.
pub const TOKEN_REFRESH_BUFFER_SECONDS: i64 = 300;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET must be configured")]
    MissingCredentials,
    #[error("Strava rejected the access token")]
    Unauthorized,
    #[error("Strava request failed: {status} {body}")]
    Status { status: u16, body: String },
    #[error("Activity has no GPS data")]
    NoGpsData,
    #[error("Strava request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected Strava payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct StravaCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub athlete: Option<Athlete>,
}

#[derive(Debug, Deserialize)]
pub struct Athlete {
    pub id: i64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub profile: Option<String>,
}

/// Read from Strava in snake_case, handed to our clients in camelCase.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ActivitySummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: i64,
    #[serde(default)]
    pub elapsed_time: i64,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub start_latlng: Option<Vec<f64>>,
    #[serde(default)]
    pub map: Option<ActivityMap>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ActivityMap {
    pub id: String,
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
}

/// GPS and elapsed-time streams of one activity; `time[i]` is seconds since start for `latlng[i]`.
#[derive(Debug, Default, PartialEq)]
pub struct ActivityStreams {
    pub latlng: Vec<[f64; 2]>,
    pub time: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub urls: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location: Option<[f64; 2]>,
}

#[derive(Clone)]
pub struct StravaClient {
    client: Client,
    auth_url: Url,
    token_url: String,
    api_base: String,
}

impl StravaClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            auth_url: Url::parse(STRAVA_AUTH_URL)?,
            token_url: STRAVA_TOKEN_URL.to_string(),
            api_base: STRAVA_API_BASE.to_string(),
        })
    }

    pub fn authorize_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("approval_prompt", "auto")
            .append_pair("scope", STRAVA_SCOPE)
            .append_pair("state", state);
        url.to_string()
    }

    pub async fn exchange_code(
        &self,
        creds: &StravaCredentials,
        code: &str,
    ) -> Result<TokenResponse, StravaError> {
        let body = json!({
            "client_id": creds.client_id,
            "client_secret": creds.client_secret,
            "code": code,
            "grant_type": "authorization_code",
        });
        send_json(self.client.post(&self.token_url).json(&body)).await
    }

    pub async fn refresh_token(
        &self,
        creds: &StravaCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, StravaError> {
        let body = json!({
            "client_id": creds.client_id,
            "client_secret": creds.client_secret,
            "refresh_token": refresh_token,
            "grant_type": "refresh_token",
        });
        send_json(self.client.post(&self.token_url).json(&body)).await
    }

    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ActivitySummary>, StravaError> {
        let query = [("page", page.to_string()), ("per_page", per_page.to_string())];
        self.get_json(access_token, "/athlete/activities", &query)
            .await
    }

    pub async fn activity(
        &self,
        access_token: &str,
        activity_id: i64,
    ) -> Result<ActivitySummary, StravaError> {
        self.get_json(access_token, &format!("/activities/{}", activity_id), &[])
            .await
    }

    pub async fn activity_streams(
        &self,
        access_token: &str,
        activity_id: i64,
    ) -> Result<ActivityStreams, StravaError> {
        let query = [
            ("keys", "latlng,time".to_string()),
            ("key_type", "value".to_string()),
        ];
        let raw: Vec<RawStream> = self
            .get_json(
                access_token,
                &format!("/activities/{}/streams", activity_id),
                &query,
            )
            .await?;
        streams_from_raw(raw)
    }

    pub async fn activity_photos(
        &self,
        access_token: &str,
        activity_id: i64,
    ) -> Result<Vec<Photo>, StravaError> {
        let query = [
            ("size", "600".to_string()),
            ("photo_sources", "true".to_string()),
        ];
        self.get_json(
            access_token,
            &format!("/activities/{}/photos", activity_id),
            &query,
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, StravaError> {
        debug!("GET {}{}", self.api_base, path);
        let request = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(access_token)
            .query(query);
        send_json(request).await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StravaError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(StravaError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StravaError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<T>().await?)
}

fn streams_from_raw(raw: Vec<RawStream>) -> Result<ActivityStreams, StravaError> {
    let mut latlng = None;
    let mut time = Vec::new();

    for stream in raw {
        match stream.kind.as_str() {
            "latlng" => latlng = Some(serde_json::from_value(stream.data)?),
            "time" => time = serde_json::from_value(stream.data)?,
            _ => {}
        }
    }

    Ok(ActivityStreams {
        latlng: latlng.ok_or(StravaError::NoGpsData)?,
        time,
    })
}

pub fn token_is_fresh(expires_at: i64, now: i64) -> bool {
    expires_at - now > TOKEN_REFRESH_BUFFER_SECONDS
}

/// Turn activity streams into route points stamped relative to the activity start.
pub fn activity_route(start_date: DateTime<Utc>, streams: &ActivityStreams) -> Vec<TrackPoint> {
    streams
        .latlng
        .iter()
        .enumerate()
        .map(|(i, [lat, lng])| {
            let at = streams
                .time
                .get(i)
                .and_then(|&secs| offset_from_start(start_date, secs))
                .unwrap_or(start_date);
            TrackPoint {
                lat: *lat,
                lng: *lng,
                timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        })
        .collect()
}

/// `start + secs`, or `None` when the offset is not a usable number of seconds.
fn offset_from_start(start: DateTime<Utc>, secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let millis = secs * 1000.0;
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let offset = ChronoDuration::try_milliseconds(millis as i64)?;
    start.checked_add_signed(offset)
}

pub fn drive_photos(photos: Vec<Photo>) -> Vec<DrivePhoto> {
    photos
        .into_iter()
        .map(|p| {
            let urls = p.urls.unwrap_or_default();
            let url = urls
                .get("600")
                .or_else(|| urls.values().next())
                .cloned()
                .unwrap_or_default();
            DrivePhoto {
                url,
                lat: p.location.map(|l| l[0]),
                lng: p.location.map(|l| l[1]),
                caption: p.caption.filter(|c| !c.trim().is_empty()),
            }
        })
        .collect()
}
