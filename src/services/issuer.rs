// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certificate issuance pipeline.
//!
//! Steps, in order:
//! 1. Load the activity and refuse anything not approved/certified
//! 2. Generate the certificate ID and verification code
//! 3. Encode the QR payload and render the PDF (blocking pool)
//! 4. Write both artifacts under the certificate's folder
//! 5. Persist the certificate record
//! 6. Mark the activity certified and link the certificate
//!
//! Nothing is persisted if step 3 fails. A failure in step 5 leaves the
//! artifacts from step 4 on disk; they are logged, not cleaned up.
//! Email is not sent here.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::db::RecordStore;
use crate::error::AppError;
use crate::models::activity::TransitionError;
use crate::models::{Activity, ActivityStatus, Certificate, CertificateStatus, EmailStatus};
use crate::services::ids;
use crate::services::qr;
use crate::services::renderer::{CertificateFields, CertificateLayout, PdfRenderer};
use crate::services::storage::ArtifactStore;

/// Issuance settings taken from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub verification_base_url: String,
    pub id_prefix: String,
    pub validity_days: i64,
    /// Refuse a second certificate for the same activity
    pub single_certificate_per_activity: bool,
}

impl IssuerSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            verification_base_url: config.verification_base_url.clone(),
            id_prefix: config.certificate_id_prefix.clone(),
            validity_days: config.certificate_validity_days,
            single_certificate_per_activity: config.single_certificate_per_activity,
        }
    }
}

#[derive(Clone)]
pub struct CertificateIssuer {
    db: RecordStore,
    artifacts: ArtifactStore,
    renderer: PdfRenderer,
    settings: IssuerSettings,
}

/// Rendered artifact bytes, before anything is written.
struct RenderedCertificate {
    pdf: Vec<u8>,
    qr_png: Vec<u8>,
}

impl CertificateIssuer {
    pub fn new(
        db: RecordStore,
        artifacts: ArtifactStore,
        renderer: PdfRenderer,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            db,
            artifacts,
            renderer,
            settings,
        }
    }

    /// Issue a certificate for `activity_id` on behalf of admin `issued_by`.
    ///
    /// Returns the stored certificate. The caller decides whether to email it.
    pub async fn issue(&self, activity_id: &str, issued_by: &str) -> Result<Certificate, AppError> {
        let activity = self
            .db
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        if !activity.is_certifiable() {
            return Err(TransitionError {
                from: activity.status,
                to: ActivityStatus::Certified,
            }
            .into());
        }

        if self.settings.single_certificate_per_activity {
            let existing = self.db.certificates_for_activity(activity_id).await?;
            if let Some(cert) = existing.first() {
                return Err(AppError::Conflict(format!(
                    "Activity {} already has certificate {}",
                    activity_id, cert.id
                )));
            }
        }

        let student = self
            .db
            .get_user(&activity.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {}", activity.student_id)))?;

        let now = Utc::now();
        let certificate_id = ids::certificate_id(&self.settings.id_prefix, now)?;
        let verification_code = ids::verification_code()?;
        let verification_url =
            qr::verification_url(&self.settings.verification_base_url, &certificate_id);

        let fields = CertificateFields {
            student_name: Some(student.name.clone()),
            title: Some(activity.title.clone()),
            organizing_body: activity.organizing_body.clone(),
            level: activity.level,
            event_date: activity.event_date,
            certificate_id: Some(certificate_id.clone()),
            description: activity.description.clone(),
        };
        let rendered = self.render(fields, verification_url.clone(), now).await?;
        let artifact_sha256 = hex::encode(Sha256::digest(&rendered.pdf));

        let stored = self
            .artifacts
            .write_certificate(&certificate_id, &rendered.pdf, &rendered.qr_png)
            .await?;

        let certificate = build_certificate(
            &activity,
            &student.name,
            issued_by,
            CertificateKeys {
                id: certificate_id.clone(),
                verification_code,
                verification_url,
            },
            stored.artifact_path.to_string_lossy().into_owned(),
            stored.qr_path.to_string_lossy().into_owned(),
            artifact_sha256,
            now,
            self.settings.validity_days,
        );

        if let Err(e) = self.db.create_certificate(&certificate).await {
            tracing::warn!(
                certificate_id = %certificate_id,
                artifact = %stored.artifact_path.display(),
                error = %e,
                "Certificate record not persisted; artifact left orphaned"
            );
            return Err(e);
        }

        let linked = self
            .db
            .update_activity(activity_id, |a: &mut Activity| {
                a.mark_certified(&certificate_id, now)?;
                Ok(())
            })
            .await;
        if let Err(e) = linked {
            tracing::warn!(
                certificate_id = %certificate_id,
                activity_id,
                error = %e,
                "Certificate persisted but activity not marked certified"
            );
            return Err(e);
        }

        tracing::info!(
            certificate_id = %certificate_id,
            activity_id,
            student_id = %activity.student_id,
            issued_by,
            "Certificate issued"
        );

        Ok(certificate)
    }

    /// QR encoding and PDF layout are CPU-bound; run them off the async workers.
    async fn render(
        &self,
        fields: CertificateFields,
        verification_url: String,
        now: DateTime<Utc>,
    ) -> Result<RenderedCertificate, AppError> {
        let renderer = self.renderer.clone();
        tokio::task::spawn_blocking(move || -> Result<RenderedCertificate, AppError> {
            let layout = CertificateLayout::from_fields(&fields, now.date_naive())?;
            let qr_image = qr::encode(&verification_url)?;
            let qr_png = qr::to_png(&qr_image)?;
            let pdf = renderer.render(&layout, &qr_image)?;
            Ok(RenderedCertificate { pdf, qr_png })
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Render task failed: {}", e)))?
    }
}

struct CertificateKeys {
    id: String,
    verification_code: String,
    verification_url: String,
}

#[allow(clippy::too_many_arguments)]
fn build_certificate(
    activity: &Activity,
    student_name: &str,
    issued_by: &str,
    keys: CertificateKeys,
    artifact_path: String,
    qr_path: String,
    artifact_sha256: String,
    now: DateTime<Utc>,
    validity_days: i64,
) -> Certificate {
    Certificate {
        id: keys.id,
        activity_id: activity.id.clone(),
        student_id: activity.student_id.clone(),
        issued_by: issued_by.to_string(),
        student_name: student_name.to_string(),
        title: activity.title.clone(),
        organizing_body: activity.organizing_body.clone(),
        level: activity.level,
        event_date: activity.event_date,
        artifact_path,
        qr_path,
        artifact_sha256,
        verification_code: keys.verification_code,
        verification_url: keys.verification_url,
        status: CertificateStatus::Active,
        revoked_at: None,
        revoked_by: None,
        revocation_reason: None,
        issued_at: now,
        expires_at: now + Duration::days(validity_days),
        view_count: 0,
        download_count: 0,
        share_count: 0,
        verification_count: 0,
        verification_history: Vec::new(),
        email_status: EmailStatus::NotSent,
        email_history: Vec::new(),
    }
}
