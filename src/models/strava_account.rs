use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct StravaAccount {
    pub athlete_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64, // unix seconds
}
