// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::activity::TransitionError;
use crate::services::notification::DeliveryError;
use crate::services::qr::QrError;
use crate::services::renderer::RenderError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient role for this operation")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Certificate rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("QR encoding failed: {0}")]
    Qr(#[from] QrError),

    #[error("Email delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Artifact storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Whether internal error details may be echoed to clients.
///
/// Set once at startup from `APP_ENV`; defaults to hiding details.
static EXPOSE_INTERNAL_DETAILS: std::sync::atomic::AtomicBool =
    std::sync::atomic::AtomicBool::new(false);

/// Allow internal error messages in responses (non-production only).
pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, std::sync::atomic::Ordering::Relaxed);
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::Transition(_) => StatusCode::CONFLICT,
            AppError::Render(RenderError::MissingField(_)) => StatusCode::BAD_REQUEST,
            AppError::Render(_) | AppError::Qr(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Delivery(err) => match err {
                DeliveryError::MissingRecipient
                | DeliveryError::MissingCertificateId
                | DeliveryError::MissingArtifactLocation => StatusCode::BAD_REQUEST,
                DeliveryError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
                DeliveryError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DeliveryError::Provider(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = match &self {
            AppError::Unauthorized => ("unauthorized", None),
            AppError::Forbidden => ("forbidden", None),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone())),
            AppError::Conflict(msg) => ("conflict", Some(msg.clone())),
            AppError::Transition(err) => ("invalid_transition", Some(err.to_string())),
            AppError::Render(RenderError::MissingField(field)) => {
                ("missing_field", Some(field.to_string()))
            }
            AppError::Render(err) => {
                tracing::error!(error = %err, "Certificate rendering failed");
                ("render_error", Some(err.to_string()))
            }
            AppError::Qr(err) => {
                tracing::error!(error = %err, "QR encoding failed");
                ("render_error", Some(err.to_string()))
            }
            AppError::Delivery(err) => ("delivery_error", Some(err.to_string())),
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Artifact storage error");
                ("storage_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                let details = EXPOSE_INTERNAL_DETAILS
                    .load(std::sync::atomic::Ordering::Relaxed)
                    .then(|| format!("{:?}", err));
                ("internal_error", details)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
