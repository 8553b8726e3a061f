use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::jwt::AdminClaims,
    content::{CreateEpisode, CreatePost, CreateVideo},
    error::AppError,
    response::ApiResponse,
    AppState,
};

#[derive(Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn dashboard(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.refresh_all().await?;
    Ok(ApiResponse::success(dashboard.snapshot().clone()))
}

pub async fn category_options(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    if dashboard.snapshot().categories.is_empty() {
        dashboard.refresh_all().await?;
    }
    Ok(ApiResponse::success(dashboard.category_options()))
}

pub async fn create_post(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Json(payload): Json<CreatePost>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_create_post();
    let id = dashboard.save_post(payload).await?;
    Ok(ApiResponse::success(json!({ "id": id })).created())
}

pub async fn update_post(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePost>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_edit_post(id);
    dashboard.save_post(payload).await?;
    Ok(ApiResponse::ok("Post updated".to_string()))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.delete_post(id, params.confirm).await?;
    Ok(ApiResponse::ok("Post deleted".to_string()))
}

pub async fn create_episode(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Json(payload): Json<CreateEpisode>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_create_episode();
    let id = dashboard.save_episode(payload).await?;
    Ok(ApiResponse::success(json!({ "id": id })).created())
}

pub async fn update_episode(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateEpisode>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_edit_episode(id);
    dashboard.save_episode(payload).await?;
    Ok(ApiResponse::ok("Episode updated".to_string()))
}

pub async fn delete_episode(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.delete_episode(id, params.confirm).await?;
    Ok(ApiResponse::ok("Episode deleted".to_string()))
}

pub async fn create_video(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Json(payload): Json<CreateVideo>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_create_video();
    let id = dashboard.save_video(payload).await?;
    Ok(ApiResponse::success(json!({ "id": id })).created())
}

pub async fn update_video(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVideo>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.begin_edit_video(id);
    dashboard.save_video(payload).await?;
    Ok(ApiResponse::ok("Video updated".to_string()))
}

pub async fn delete_video(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.delete_video(id, params.confirm).await?;
    Ok(ApiResponse::ok("Video deleted".to_string()))
}
