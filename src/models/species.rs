use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    pub id: Uuid,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: String,
    pub family: Option<String>,
}
