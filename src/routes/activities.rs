// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity submission, review and certificate issuance routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityStatus, Role};
use crate::services::{NewActivity, ProofUpload};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound on a multipart submission (form fields plus proof file).
const MAX_SUBMISSION_BYTES: usize = 10 * 1024 * 1024;

/// Activity routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/activities",
            get(list_own_activities)
                .post(submit_activity)
                .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
        )
        .route("/api/activities/pending", get(list_pending))
        .route("/api/activities/all", get(list_all))
        .route("/api/activities/{id}/approve", post(approve_activity))
        .route("/api/activities/{id}/reject", post(reject_activity))
        .route("/api/activities/{id}/certificate", post(issue_certificate))
}

// ─── Submission ──────────────────────────────────────────────

fn parse_optional<T: std::str::FromStr<Err = String>>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>> {
    match fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map(Some).map_err(AppError::BadRequest),
        None => Ok(None),
    }
}

/// Turn multipart text fields into a submission.
pub fn parse_submission(fields: &HashMap<String, String>) -> Result<NewActivity> {
    let category = parse_optional(fields, "category")?
        .ok_or_else(|| AppError::BadRequest("category is required".to_string()))?;

    let event_date = match fields
        .get("event_date")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
    {
        Some(raw) => Some(
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid event_date '{}'", raw)))?,
        ),
        None => None,
    };

    let tags = |name: &str| {
        fields
            .get(name)
            .map(|raw| crate::models::SkillTags::parse_list(raw))
            .unwrap_or_default()
    };

    Ok(NewActivity {
        title: fields.get("title").cloned().unwrap_or_default(),
        description: fields.get("description").cloned(),
        category,
        event_date,
        organizing_body: fields.get("organizing_body").cloned(),
        level: parse_optional(fields, "level")?,
        technical_skills: tags("technical_skills"),
        soft_skills: tags("soft_skills"),
        tools: tags("tools"),
    })
}

/// Submit a new activity claim (students only).
async fn submit_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Activity>)> {
    user.require(&[Role::Student])?;

    let mut fields = HashMap::new();
    let mut proof = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "proof" {
            let file_name = field.file_name().unwrap_or("proof").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read proof: {}", e)))?;
            if !bytes.is_empty() {
                proof = Some(ProofUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    let input = parse_submission(&fields)?;
    let activity = state.activities.submit(&user.user_id, input, proof).await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// ─── Listings ────────────────────────────────────────────────

async fn list_own_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Activity>>> {
    user.require(&[Role::Student])?;
    Ok(Json(state.activities.list_for_student(&user.user_id).await?))
}

async fn list_pending(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Activity>>> {
    user.require(&[Role::Faculty, Role::Admin])?;
    Ok(Json(state.activities.pending().await?))
}

#[derive(Debug, Deserialize)]
pub struct ListAllQuery {
    pub status: Option<String>,
}

async fn list_all(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListAllQuery>,
) -> Result<Json<Vec<Activity>>> {
    user.require(&[Role::Admin])?;

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<ActivityStatus>().map_err(AppError::BadRequest)?),
        None => None,
    };
    Ok(Json(state.activities.list_all(status).await?))
}

// ─── Review ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

async fn approve_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<Activity>> {
    user.require(&[Role::Faculty, Role::Admin])?;

    let comment = body.and_then(|Json(b)| b.comment);
    let activity = state
        .activities
        .approve(&activity_id, &user.user_id, comment)
        .await?;
    Ok(Json(activity))
}

async fn reject_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<Activity>> {
    user.require(&[Role::Faculty, Role::Admin])?;

    let activity = state
        .activities
        .reject(&activity_id, &user.user_id, &body.reason)
        .await?;
    Ok(Json(activity))
}

// ─── Issuance ────────────────────────────────────────────────

/// Handle returned after issuing; email is a separate call.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IssueCertificateResponse {
    pub certificate_id: String,
    pub activity_id: String,
    pub verification_code: String,
    pub verification_url: String,
    pub artifact_sha256: String,
    pub issued_at: String,
    pub expires_at: String,
}

async fn issue_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<(StatusCode, Json<IssueCertificateResponse>)> {
    user.require(&[Role::Admin])?;

    let cert = state.issuer.issue(&activity_id, &user.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueCertificateResponse {
            certificate_id: cert.id,
            activity_id: cert.activity_id,
            verification_code: cert.verification_code,
            verification_url: cert.verification_url,
            artifact_sha256: cert.artifact_sha256,
            issued_at: format_utc_rfc3339(cert.issued_at),
            expires_at: format_utc_rfc3339(cert.expires_at),
        }),
    ))
}
