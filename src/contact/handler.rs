use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use validator::Validate;

use crate::{
    contact::{fields_for, ContactSubmission, InquiryKind},
    email::TemplateId,
    error::AppError,
    response::ApiResponse,
    AppState,
};

const SUBMISSIONS_TABLE: &str = "contact_submissions_clr";

/// Field descriptors for one inquiry kind, so the front end renders the
/// same set the server validates.
pub async fn field_specs(
    Path(kind): Path<InquiryKind>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::success(fields_for(kind)))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<ContactSubmission>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let missing = payload.missing_required_fields();
    if !missing.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    sqlx::query(&format!(
        r#"
        INSERT INTO {SUBMISSIONS_TABLE}
            (inquiry_type, name, email, company, role, phone, subject, message,
             preferred_contact, budget, timeline, referral_source, attachment_url, priority)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#
    ))
    .bind(payload.inquiry_type.as_str())
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.company)
    .bind(&payload.role)
    .bind(&payload.phone)
    .bind(&payload.subject)
    .bind(&payload.message)
    .bind(&payload.preferred_contact)
    .bind(&payload.budget)
    .bind(&payload.timeline)
    .bind(&payload.referral_source)
    .bind(&payload.attachment_url)
    .bind(&payload.priority)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("failed to store contact submission: {:?}", e);
        AppError::ServiceUnavailable("Could not store your message".to_string())
    })?;

    // Confirmation email is best-effort; a provider outage never turns a
    // stored submission into a user-facing failure.
    if let (Some(email), Some(name)) = (&payload.email, &payload.name) {
        let mut vars = HashMap::new();
        vars.insert("name", name.clone());
        vars.insert(
            "subject",
            payload.subject.clone().unwrap_or_default(),
        );
        if let Err(err) = state
            .email
            .send(email, TemplateId::ContactConfirmation, &vars)
            .await
        {
            tracing::warn!("contact confirmation email failed: {}", err);
        }
    }

    Ok(ApiResponse::ok("Message received".to_string()))
}
