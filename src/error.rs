use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::strava::StravaError;
use crate::track::TrackError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to API clients as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    Upstream(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<TrackError> for ApiError {
    fn from(e: TrackError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<StravaError> for ApiError {
    fn from(e: StravaError) -> Self {
        match e {
            StravaError::Unauthorized => Self::Unauthorized(
                "Strava session expired. Please reconnect your Strava account.".to_string(),
            ),
            StravaError::MissingCredentials => Self::PreconditionFailed(e.to_string()),
            StravaError::NoGpsData => Self::BadRequest(e.to_string()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(e) => error!("Database error: {}", e),
            ApiError::Internal(e) => error!("Internal error: {:#}", e),
            ApiError::Upstream(msg) => error!("Upstream error: {}", msg),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_track_error_becomes_bad_request() {
        let err: ApiError = TrackError::InsufficientPoints { found: 1 }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "document must contain at least 2 track points"
        );
    }

    #[test]
    fn test_strava_error_mapping() {
        let err: ApiError = StravaError::Unauthorized.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: ApiError = StravaError::MissingCredentials.into();
        assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);

        let err: ApiError = StravaError::Status {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_internal_details_not_leaked() {
        let err = ApiError::Internal(anyhow::anyhow!("connection string secret"));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"internal error"}"#);
    }
}
