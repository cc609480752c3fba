// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public certificate verification.
//!
//! Two lookup keys reach the same certificate record:
//! - the certificate ID, which is what the QR code encodes
//! - the verification code, typed in by a human on the code lookup page
//!
//! Both go through [`VerificationService::resolve`], so the returned summary
//! content is identical for either key.

use chrono::Utc;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::RecordStore;
use crate::error::AppError;
use crate::models::certificate::{LookupKey, VerificationEvent};
use crate::models::summary::{ActivitySummary, CertificateSummary, StudentSummary};
use crate::models::{Certificate, CertificateStatus};

/// Who is verifying.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Authenticated user ID, or "public"
    pub identity: String,
    pub source_address: String,
}

impl Caller {
    pub fn public(source_address: impl Into<String>) -> Self {
        Self {
            identity: "public".to_string(),
            source_address: source_address.into(),
        }
    }
}

/// Verification response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationResult {
    pub valid: bool,
    pub status: CertificateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
}

impl VerificationResult {
    fn invalid(status: CertificateStatus) -> Self {
        Self {
            valid: false,
            status,
            certificate: None,
            activity: None,
            student: None,
        }
    }
}

#[derive(Clone)]
pub struct VerificationService {
    db: RecordStore,
    enforce_expiry: bool,
}

impl VerificationService {
    pub fn new(db: RecordStore, enforce_expiry: bool) -> Self {
        Self { db, enforce_expiry }
    }

    /// Look up by certificate ID (the QR target).
    pub async fn verify_by_id(
        &self,
        certificate_id: &str,
        caller: &Caller,
    ) -> Result<VerificationResult, AppError> {
        let cert = self.db.get_certificate(certificate_id).await?;
        self.resolve(cert, LookupKey::CertificateId, caller).await
    }

    /// Look up by the separate verification code. Codes are uppercase hex, so
    /// surrounding whitespace and letter case are ignored.
    pub async fn verify_by_code(
        &self,
        code: &str,
        caller: &Caller,
    ) -> Result<VerificationResult, AppError> {
        let code = code.trim().to_ascii_uppercase();
        let cert = self.db.certificate_by_code(&code).await?;
        self.resolve(cert, LookupKey::VerificationCode, caller).await
    }

    async fn resolve(
        &self,
        cert: Option<Certificate>,
        lookup: LookupKey,
        caller: &Caller,
    ) -> Result<VerificationResult, AppError> {
        let Some(cert) = cert else {
            tracing::debug!(?lookup, "Verification lookup missed");
            return Err(AppError::NotFound("Certificate".to_string()));
        };

        let now = Utc::now();
        let status = cert.effective_status(now, self.enforce_expiry);
        if status != CertificateStatus::Active {
            tracing::warn!(certificate_id = %cert.id, ?status, "Verification of inactive certificate");
            return Ok(VerificationResult::invalid(status));
        }

        let event = VerificationEvent {
            verified_at: now,
            verified_by: caller.identity.clone(),
            source_address: caller.source_address.clone(),
            lookup,
        };
        let enforce_expiry = self.enforce_expiry;

        // Status is re-checked under the write so a concurrent revocation wins.
        let mut counted = false;
        let updated = self
            .db
            .update_certificate(&cert.id, |c: &mut Certificate| {
                counted = c.effective_status(now, enforce_expiry) == CertificateStatus::Active;
                if counted {
                    c.record_verification(event.clone());
                }
                Ok(())
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate".to_string()))?;

        if !counted {
            return Ok(VerificationResult::invalid(
                updated.effective_status(now, enforce_expiry),
            ));
        }

        let (activity, student) = futures_util::try_join!(
            self.db.get_activity(&updated.activity_id),
            self.db.get_user(&updated.student_id)
        )?;

        tracing::debug!(
            certificate_id = %updated.id,
            ?lookup,
            verified_by = %caller.identity,
            count = updated.verification_count,
            "Certificate verified"
        );

        Ok(VerificationResult {
            valid: true,
            status: CertificateStatus::Active,
            certificate: Some(CertificateSummary::from_certificate(
                &updated,
                CertificateStatus::Active,
            )),
            activity: activity.as_ref().map(ActivitySummary::from),
            student: student.as_ref().map(StudentSummary::from),
        })
    }
}
