use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::error::{ApiError, ApiResult};

/// Check that a body is a GeoJSON FeatureCollection. Returns the feature count.
pub fn validate_road_network(body: &[u8]) -> ApiResult<usize> {
    let document: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

    let is_collection = document.get("type").and_then(Value::as_str) == Some("FeatureCollection");
    match document.get("features").and_then(Value::as_array) {
        Some(features) if is_collection => Ok(features.len()),
        _ => Err(ApiError::bad_request(
            "File must be a GeoJSON FeatureCollection",
        )),
    }
}

/// Replace the road overlay served to the map with a validated upload.
pub async fn save_road_network(output: &Path, body: &[u8]) -> ApiResult<usize> {
    let feature_count = validate_road_network(body)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("creating {}: {}", parent.display(), e))?;
    }
    tokio::fs::write(output, body)
        .await
        .map_err(|e| anyhow::anyhow!("writing {}: {}", output.display(), e))?;

    info!(
        "Road network replaced with {} features at {}",
        feature_count,
        output.display()
    );
    Ok(feature_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection_counts_features() {
        let body = br#"{"type":"FeatureCollection","features":[{"type":"Feature"},{"type":"Feature"}]}"#;
        assert_eq!(validate_road_network(body).unwrap(), 2);
    }

    #[test]
    fn test_empty_collection_is_valid() {
        let body = br#"{"type":"FeatureCollection","features":[]}"#;
        assert_eq!(validate_road_network(body).unwrap(), 0);
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = validate_road_network(b"{not json").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON");
    }

    #[test]
    fn test_rejects_other_geojson() {
        for body in [
            &br#"{"type":"Feature","features":[]}"#[..],
            &br#"{"type":"FeatureCollection"}"#[..],
            &br#"{"type":"FeatureCollection","features":{}}"#[..],
        ] {
            let err = validate_road_network(body).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("roads-{}", uuid::Uuid::new_v4()));
        let output = dir.join("data").join("roads.geojson");
        let body = br#"{"type":"FeatureCollection","features":[{"type":"Feature"}]}"#;

        assert_eq!(save_road_network(&output, body).await.unwrap(), 1);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), body.to_vec());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
