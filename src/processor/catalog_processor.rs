use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::lodge::Lodge;
use crate::models::species::Species;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecies {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: String,
    pub family: Option<String>,
}

pub async fn all_species(pool: &DbPool) -> ApiResult<Vec<Species>> {
    let species = sqlx::query_as::<_, Species>(queries::SELECT_ALL_SPECIES)
        .fetch_all(pool)
        .await?;
    Ok(species)
}

pub async fn species_by_category(pool: &DbPool, category: &str) -> ApiResult<Vec<Species>> {
    let species = sqlx::query_as::<_, Species>(queries::SELECT_SPECIES_BY_CATEGORY)
        .bind(category)
        .fetch_all(pool)
        .await?;
    Ok(species)
}

pub async fn categories(pool: &DbPool) -> ApiResult<Vec<String>> {
    let categories = sqlx::query_scalar::<_, String>(queries::SELECT_SPECIES_CATEGORIES)
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

pub async fn search_species(pool: &DbPool, query: &str) -> ApiResult<Vec<Species>> {
    let species = sqlx::query_as::<_, Species>(queries::SEARCH_SPECIES)
        .bind(escape_like(query.trim()))
        .fetch_all(pool)
        .await?;
    Ok(species)
}

pub async fn create_species(pool: &DbPool, input: NewSpecies) -> ApiResult<Species> {
    let common_name = input.common_name.trim();
    let category = input.category.trim();
    if common_name.is_empty() || category.is_empty() {
        return Err(ApiError::bad_request("commonName and category are required"));
    }

    let species = sqlx::query_as::<_, Species>(queries::INSERT_SPECIES)
        .bind(common_name)
        .bind(non_blank(input.scientific_name))
        .bind(category)
        .bind(non_blank(input.family))
        .fetch_one(pool)
        .await?;

    info!("Added species {} ({})", species.common_name, species.id);
    Ok(species)
}

pub async fn lodges(pool: &DbPool) -> ApiResult<Vec<Lodge>> {
    let lodges = sqlx::query_as::<_, Lodge>(queries::SELECT_LODGES)
        .fetch_all(pool)
        .await?;
    Ok(lodges)
}

pub async fn lodge(pool: &DbPool, lodge_id: Option<Uuid>) -> ApiResult<Lodge> {
    let lodge_id = lodge_id.ok_or_else(|| ApiError::not_found("No lodge assigned"))?;
    sqlx::query_as::<_, Lodge>(queries::SELECT_LODGE)
        .bind(lodge_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Lodge not found"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("lion"), "lion");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Felidae ".into())), Some("Felidae".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
