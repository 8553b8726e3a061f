use axum::{extract::State, response::IntoResponse, Json};
use std::collections::HashMap;
use validator::Validate;

use crate::{
    email::TemplateId,
    error::AppError,
    response::ApiResponse,
    subscribe::{LeadMagnetResponse, SubscribeRequest},
    AppState,
};

const SUBSCRIPTIONS_TABLE: &str = "newsletter_subscriptions_clr";

const LEAD_MAGNET_URL: &str = "https://chefcast.fm/downloads/leadership-toolkit.pdf";

async fn store_subscription(
    state: &AppState,
    payload: &SubscribeRequest,
    source: &str,
    tags: &[String],
) -> Result<(), AppError> {
    // A repeat subscriber is not an error; the existing row wins.
    sqlx::query(&format!(
        r#"
        INSERT INTO {SUBSCRIPTIONS_TABLE}
            (first_name, email, role, source_page, conversion_source, tags, synced)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        ON CONFLICT (email) DO NOTHING
        "#
    ))
    .bind(&payload.first_name)
    .bind(&payload.email)
    .bind(&payload.role)
    .bind(payload.source_page.as_deref().unwrap_or(source))
    .bind(payload.conversion_source.as_deref().unwrap_or("organic"))
    .bind(tags)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("failed to store subscription: {:?}", e);
        AppError::ServiceUnavailable("Could not store your subscription".to_string())
    })?;
    Ok(())
}

/// Flip the synced flag after a successful provider send; ignored on
/// failure since the flag only drives later re-sync.
async fn mark_synced(state: &AppState, email: &str) {
    let result = sqlx::query(&format!(
        "UPDATE {SUBSCRIPTIONS_TABLE} SET synced = TRUE WHERE email = $1"
    ))
    .bind(email)
    .execute(&state.pool)
    .await;
    if let Err(err) = result {
        tracing::warn!("could not mark subscription synced: {:?}", err);
    }
}

pub async fn newsletter(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let tags = if payload.tags.is_empty() {
        vec!["newsletter".to_string()]
    } else {
        payload.tags.clone()
    };
    store_subscription(&state, &payload, "newsletter", &tags).await?;

    let mut vars = HashMap::new();
    vars.insert(
        "first_name",
        payload.first_name.clone().unwrap_or_else(|| "Friend".to_string()),
    );
    match state.email.send(&payload.email, TemplateId::Welcome, &vars).await {
        Ok(()) => mark_synced(&state, &payload.email).await,
        Err(err) => tracing::warn!("welcome email failed: {}", err),
    }

    Ok(ApiResponse::ok("Subscribed".to_string()))
}

pub async fn lead_magnet(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let tags = vec!["lead_magnet".to_string(), "leadership_toolkit".to_string()];
    store_subscription(&state, &payload, "lead_magnet", &tags).await?;

    let mut vars = HashMap::new();
    vars.insert(
        "first_name",
        payload.first_name.clone().unwrap_or_else(|| "Friend".to_string()),
    );
    vars.insert("download_url", LEAD_MAGNET_URL.to_string());
    match state
        .email
        .send(&payload.email, TemplateId::LeadMagnet, &vars)
        .await
    {
        Ok(()) => mark_synced(&state, &payload.email).await,
        Err(err) => tracing::warn!("lead magnet email failed: {}", err),
    }

    Ok(ApiResponse::success(LeadMagnetResponse {
        download_url: LEAD_MAGNET_URL.to_string(),
    }))
}
