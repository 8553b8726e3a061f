use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    content::repo::{ContentRepository, ContentStore},
    error::AppError,
    response::ApiResponse,
    AppState,
};

// Public pages see published content only; drafts and archived rows
// never leave the admin surface.

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let repo = ContentRepository::new(state.pool.clone());
    let posts = repo.list_published_posts().await?;
    Ok(ApiResponse::success(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let repo = ContentRepository::new(state.pool.clone());
    let post = repo.find_post_by_slug(&slug).await?;
    Ok(ApiResponse::success(post))
}

pub async fn list_episodes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let repo = ContentRepository::new(state.pool.clone());
    let episodes = repo.list_published_episodes().await?;
    Ok(ApiResponse::success(episodes))
}

pub async fn list_videos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let repo = ContentRepository::new(state.pool.clone());
    let videos = repo.list_published_videos().await?;
    Ok(ApiResponse::success(videos))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let repo = ContentRepository::new(state.pool.clone());
    let categories = repo.list_categories().await?;
    Ok(ApiResponse::success(categories))
}
