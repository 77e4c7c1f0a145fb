use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize)]
pub struct Lodge {
    pub id: Uuid,
    pub name: String,
}
