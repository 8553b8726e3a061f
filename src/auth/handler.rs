use axum::{extract::State, response::IntoResponse};
use axum::Json;
use validator::Validate;

use crate::{
    auth::{gate::AuthGate, jwt, AuthResponse, SessionUser, SignInRequest},
    error::AppError,
    response::ApiResponse,
    AppState,
};

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let gate = AuthGate::from_settings(state.pool.clone(), &state.settings);
    let session = gate.sign_in(&payload.email, &payload.password).await?;

    let token = jwt::create_token(
        session.user_id,
        &session.email,
        session.is_admin,
        session.emergency,
        &state.settings.jwt_secret,
    )
    .map_err(|_| AppError::InternalServerError)?;

    Ok(ApiResponse::success(AuthResponse {
        token,
        user: SessionUser {
            id: session.user_id,
            email: session.email,
            full_name: session.full_name,
            is_admin: session.is_admin,
        },
        emergency_access: session.emergency,
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    claims: jwt::Claims,
) -> Result<impl IntoResponse, AppError> {
    let gate = AuthGate::from_settings(state.pool.clone(), &state.settings);
    // Best-effort: the response is a success regardless of the remote call.
    gate.sign_out(&claims.email).await;
    Ok(ApiResponse::ok("Signed out".to_string()))
}

pub async fn me(claims: jwt::Claims) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(SessionUser {
        id: claims.sub,
        email: claims.email,
        full_name: None,
        is_admin: claims.admin,
    }))
}
