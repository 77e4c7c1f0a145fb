use sqlx::FromRow;

pub const STRAVA_CLIENT_ID_KEY: &str = "strava_client_id";
pub const STRAVA_CLIENT_SECRET_KEY: &str = "strava_client_secret";

#[derive(Debug, FromRow)]
pub struct AppSetting {
    pub key: String,
    pub value: String,
}

/// Look up `key` among fetched settings, treating an empty value as unset.
pub fn setting_value<'a>(rows: &'a [AppSetting], key: &str) -> Option<&'a str> {
    rows.iter()
        .find(|r| r.key == key)
        .map(|r| r.value.as_str())
        .filter(|v| !v.is_empty())
}
