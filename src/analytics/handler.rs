use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    analytics::{summarize, TrackEventRequest, VideoEvent},
    auth::jwt::AdminClaims,
    error::AppError,
    response::ApiResponse,
    AppState,
};

const ANALYTICS_TABLE: &str = "video_analytics_clr";

/// Public: the player posts lifecycle events as they happen.
pub async fn track_event(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<TrackEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {ANALYTICS_TABLE}
            (video_id, session_id, user_email, event_type, watch_time_seconds,
             completion_percentage, device_type, referrer_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#
    ))
    .bind(video_id)
    .bind(&payload.session_id)
    .bind(&payload.user_email)
    .bind(payload.event_type)
    .bind(payload.watch_time_seconds)
    .bind(payload.completion_percentage)
    .bind(&payload.device_type)
    .bind(&payload.referrer_url)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("failed to record video event: {:?}", e);
        AppError::ServiceUnavailable("Could not record event".to_string())
    })?;

    Ok(ApiResponse::ok("Event recorded".to_string()))
}

/// Admin: aggregate stats for one video, derived from the raw rows.
pub async fn video_stats(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let events = sqlx::query_as::<_, VideoEvent>(&format!(
        "SELECT * FROM {ANALYTICS_TABLE} WHERE video_id = $1 ORDER BY created_at ASC"
    ))
    .bind(video_id)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("failed to fetch video events: {:?}", e);
        AppError::ServiceUnavailable("Could not load analytics".to_string())
    })?;

    Ok(ApiResponse::success(summarize(&events)))
}
