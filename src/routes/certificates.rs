// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certificate routes: email delivery, revocation, listing, download, sharing.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::certificate::EmailAttempt;
use crate::models::summary::CertificateSummary;
use crate::models::{Certificate, CertificateStatus, EmailStatus, Role};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/certificates", get(list_own_certificates))
        .route("/api/certificates/{id}/email", post(email_certificate))
        .route("/api/certificates/{id}/revoke", post(revoke_certificate))
        .route("/api/certificates/{id}/download", get(download_certificate))
        .route("/api/certificates/{id}/share", post(share_certificate))
}

/// Load a certificate the caller may act on as owner (or admin, if allowed).
async fn owned_certificate(
    state: &AppState,
    user: &AuthUser,
    certificate_id: &str,
    admin_allowed: bool,
) -> Result<Certificate> {
    let cert = state
        .db
        .get_certificate(certificate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))?;

    let is_owner = user.role == Role::Student && cert.student_id == user.user_id;
    let is_admin = admin_allowed && user.role == Role::Admin;
    if !is_owner && !is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(cert)
}

// ─── Email ───────────────────────────────────────────────────

async fn email_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(certificate_id): Path<String>,
) -> Result<Json<EmailAttempt>> {
    user.require(&[Role::Admin])?;
    Ok(Json(state.dispatcher.send_certificate(&certificate_id).await?))
}

// ─── Revocation ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub reason: String,
}

async fn revoke_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(certificate_id): Path<String>,
    Json(body): Json<RevokeRequest>,
) -> Result<Json<CertificateSummary>> {
    user.require(&[Role::Admin])?;

    let reason = body.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "A revocation reason is required".to_string(),
        ));
    }

    let now = Utc::now();
    let revoked_by = user.user_id.clone();
    let cert = state
        .db
        .update_certificate(&certificate_id, move |c: &mut Certificate| {
            if c.revoke(&revoked_by, reason.clone(), now) {
                Ok(())
            } else {
                Err(AppError::Conflict(format!(
                    "Certificate {} is already revoked",
                    c.id
                )))
            }
        })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))?;

    tracing::info!(certificate_id = %cert.id, revoked_by = %user.user_id, "Certificate revoked");
    Ok(Json(CertificateSummary::from_certificate(
        &cert,
        CertificateStatus::Revoked,
    )))
}

// ─── Owner views ─────────────────────────────────────────────

/// A student's view of one of their certificates.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OwnCertificate {
    #[serde(flatten)]
    pub summary: CertificateSummary,
    pub activity_id: String,
    pub verification_code: String,
    pub verification_url: String,
    pub email_status: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub view_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub download_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub share_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub verification_count: u64,
}

fn email_status_str(status: EmailStatus) -> &'static str {
    match status {
        EmailStatus::NotSent => "not_sent",
        EmailStatus::Sent => "sent",
        EmailStatus::Failed => "failed",
    }
}

async fn list_own_certificates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OwnCertificate>>> {
    user.require(&[Role::Student])?;

    let now = Utc::now();
    let enforce = state.config.enforce_certificate_expiry;
    let certificates = state.db.certificates_for_student(&user.user_id).await?;

    Ok(Json(
        certificates
            .into_iter()
            .map(|c| OwnCertificate {
                summary: CertificateSummary::from_certificate(&c, c.effective_status(now, enforce)),
                activity_id: c.activity_id,
                verification_code: c.verification_code,
                verification_url: c.verification_url,
                email_status: email_status_str(c.email_status).to_string(),
                view_count: c.view_count,
                download_count: c.download_count,
                share_count: c.share_count,
                verification_count: c.verification_count,
            })
            .collect(),
    ))
}

/// Stream the PDF to its owner (or an admin) and count the download.
async fn download_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(certificate_id): Path<String>,
) -> Result<impl IntoResponse> {
    let cert = owned_certificate(&state, &user, &certificate_id, true).await?;

    let pdf = state
        .artifacts
        .read(std::path::Path::new(&cert.artifact_path))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artifact for certificate {}", cert.id)))?;

    state
        .db
        .update_certificate(&cert.id, |c: &mut Certificate| {
            c.download_count += 1;
            Ok(())
        })
        .await?;

    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        crate::services::storage::sanitize_component(&cert.id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShareResponse {
    pub certificate_id: String,
    pub verification_url: String,
    pub verification_code: String,
}

/// Hand the owner their public verification link and count the share.
async fn share_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(certificate_id): Path<String>,
) -> Result<Json<ShareResponse>> {
    let cert = owned_certificate(&state, &user, &certificate_id, false).await?;
    if cert.status == CertificateStatus::Revoked {
        return Err(AppError::Conflict(format!(
            "Certificate {} is revoked",
            cert.id
        )));
    }

    let cert = state
        .db
        .update_certificate(&cert.id, |c: &mut Certificate| {
            c.share_count += 1;
            Ok(())
        })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))?;

    Ok(Json(ShareResponse {
        certificate_id: cert.id,
        verification_url: cert.verification_url,
        verification_code: cert.verification_code,
    }))
}
