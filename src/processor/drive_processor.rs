use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::{queries, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::drive::{DriveDetail, DrivePhoto, DriveSession, DriveSummary};
use crate::models::sighting::SightingView;
use crate::track::gpx::parse_gpx;
use crate::track::route::{append_points, RouteSpan};
use crate::track::{TrackError, TrackPoint, MIN_TRACK_POINTS};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Open a drive for the user, or return the one already open.
pub async fn start_drive(pool: &DbPool, user: &CurrentUser) -> ApiResult<DriveSession> {
    // The partial unique index on open drives turns a second start into a no-op.
    let inserted = sqlx::query(queries::INSERT_OPEN_DRIVE)
        .bind(user.id)
        .bind(user.lodge_id)
        .execute(pool)
        .await?
        .rows_affected();

    let drive = sqlx::query_as::<_, DriveSession>(queries::SELECT_OPEN_DRIVE)
        .bind(user.id)
        .fetch_one(pool)
        .await?;

    if inserted > 0 {
        info!("Started drive {} for user {}", drive.id, user.id);
    } else {
        info!("Ignored start for user {} with open drive {}", user.id, drive.id);
    }

    Ok(drive)
}

pub async fn active_drive(pool: &DbPool, user_id: Uuid) -> ApiResult<Option<DriveDetail>> {
    let drive = sqlx::query_as::<_, DriveSession>(queries::SELECT_OPEN_DRIVE)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match drive {
        Some(drive) => Ok(Some(with_sightings(pool, drive).await?)),
        None => Ok(None),
    }
}

/// Append a flushed batch of captured points to an open drive. Returns the new route length.
pub async fn add_route_points(
    pool: &DbPool,
    user_id: Uuid,
    drive_id: Uuid,
    points: Vec<TrackPoint>,
) -> ApiResult<usize> {
    let mut tx = pool.begin().await?;

    let drive = lock_drive(&mut tx, user_id, drive_id).await?;

    let added = points.len();
    let route = append_points(drive.route.0, points);

    sqlx::query(queries::UPDATE_DRIVE_ROUTE)
        .bind(drive_id)
        .bind(Json(&route))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Appended {} points to drive {} ({} total)",
        added,
        drive_id,
        route.len()
    );
    Ok(route.len())
}

/// Close an open drive, keeping any points still buffered on the client.
pub async fn end_drive(
    pool: &DbPool,
    user_id: Uuid,
    drive_id: Uuid,
    final_points: Vec<TrackPoint>,
) -> ApiResult<DriveSession> {
    let mut tx = pool.begin().await?;

    let drive = lock_drive(&mut tx, user_id, drive_id).await?;

    let route = append_points(drive.route.0, final_points);

    sqlx::query(queries::UPDATE_DRIVE_END)
        .bind(drive_id)
        .bind(Json(&route))
        .execute(&mut *tx)
        .await?;

    let ended = sqlx::query_as::<_, DriveSession>(queries::SELECT_DRIVE)
        .bind(drive_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Ended drive {} with {} points", drive_id, route.len());
    Ok(ended)
}

pub async fn list_drives(
    pool: &DbPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> ApiResult<Vec<DriveSummary>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let drives = sqlx::query_as::<_, DriveSummary>(queries::SELECT_DRIVE_SUMMARIES)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(drives)
}

pub async fn drive_detail(pool: &DbPool, user_id: Uuid, drive_id: Uuid) -> ApiResult<DriveDetail> {
    let drive = sqlx::query_as::<_, DriveSession>(queries::SELECT_DRIVE)
        .bind(drive_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Drive not found"))?;

    with_sightings(pool, drive).await
}

/// Create a drive from a GPX document. Returns the new drive id.
pub async fn import_gpx(pool: &DbPool, user: &CurrentUser, document: &str) -> ApiResult<Uuid> {
    let track = match parse_gpx(document) {
        Ok(t) => t,
        Err(e) => {
            let TrackError::InsufficientPoints { found } = &e;
            warn!(
                "Rejected GPX upload from user {}: {} usable points",
                user.id, found
            );
            return Err(e.into());
        }
    };

    let drive_id = create_completed_drive(pool, user, track.points, Vec::new(), track.name).await?;
    info!("Imported GPX drive {} for user {}", drive_id, user.id);
    Ok(drive_id)
}

/// Persist a finished drive built from a complete route (GPX upload or Strava import).
pub async fn create_completed_drive(
    pool: &DbPool,
    user: &CurrentUser,
    route: Vec<TrackPoint>,
    photos: Vec<DrivePhoto>,
    notes: Option<String>,
) -> ApiResult<Uuid> {
    if route.len() < MIN_TRACK_POINTS {
        return Err(ApiError::bad_request(
            "Route has insufficient GPS data to create a drive.",
        ));
    }
    let span = RouteSpan::of(&route)
        .ok_or_else(|| ApiError::bad_request("Route has no points"))?;

    let drive_id: Uuid = sqlx::query_scalar(queries::INSERT_COMPLETED_DRIVE)
        .bind(user.id)
        .bind(user.lodge_id)
        .bind(span.started_at)
        .bind(span.ended_at)
        .bind(Json(&route))
        .bind(Json(&photos))
        .bind(notes)
        .fetch_one(pool)
        .await?;

    Ok(drive_id)
}

/// Lock the drive row and check the caller may still write to it.
async fn lock_drive(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    drive_id: Uuid,
) -> ApiResult<DriveSession> {
    let drive = sqlx::query_as::<_, DriveSession>(queries::SELECT_DRIVE_FOR_UPDATE)
        .bind(drive_id)
        .fetch_optional(&mut **tx)
        .await?;
    writable_drive(drive, user_id)
}

/// Someone else's drive is reported as missing; an ended drive can't take more points.
fn writable_drive(drive: Option<DriveSession>, user_id: Uuid) -> ApiResult<DriveSession> {
    match drive {
        Some(d) if d.user_id != user_id => Err(ApiError::not_found("Drive not found")),
        Some(d) if !d.is_open() => Err(ApiError::Conflict("Drive has already ended".to_string())),
        Some(d) => Ok(d),
        None => Err(ApiError::not_found("Drive not found")),
    }
}

async fn with_sightings(pool: &DbPool, drive: DriveSession) -> ApiResult<DriveDetail> {
    let sightings = sqlx::query_as::<_, SightingView>(queries::SELECT_DRIVE_SIGHTINGS)
        .bind(drive.id)
        .fetch_all(pool)
        .await?;

    Ok(DriveDetail { drive, sightings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const OWNER: &str = "6f1c1d1e-9a55-4c44-8a44-2f0d7c3b9b10";
    const OTHER: &str = "0d5b8c3e-7f3c-4b8a-9f51-2b6f0b3f7d11";

    fn drive(owner: &str, ended: bool) -> DriveSession {
        DriveSession {
            id: Uuid::new_v4(),
            user_id: Uuid::parse_str(owner).unwrap(),
            lodge_id: None,
            started_at: Utc::now(),
            ended_at: ended.then(Utc::now),
            route: Json(Vec::new()),
            photos: Json(Vec::new()),
            notes: None,
        }
    }

    #[test]
    fn test_open_drive_of_owner_is_writable() {
        let owner = Uuid::parse_str(OWNER).unwrap();
        let d = writable_drive(Some(drive(OWNER, false)), owner).unwrap();
        assert_eq!(d.user_id, owner);
    }

    #[test]
    fn test_other_users_drive_is_not_found() {
        let other = Uuid::parse_str(OTHER).unwrap();
        let err = writable_drive(Some(drive(OWNER, false)), other).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Ownership is checked before state, so an ended drive doesn't leak either.
        let err = writable_drive(Some(drive(OWNER, true)), other).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_ended_drive_is_conflict() {
        let owner = Uuid::parse_str(OWNER).unwrap();
        let err = writable_drive(Some(drive(OWNER, true)), owner).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "Drive has already ended");
    }

    #[test]
    fn test_missing_drive_is_not_found() {
        let owner = Uuid::parse_str(OWNER).unwrap();
        let err = writable_drive(None, owner).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
