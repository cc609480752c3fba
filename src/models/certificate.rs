// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Issued certificate model.
//!
//! A certificate has two unique lookup keys: its ID (embedded in the QR
//! code URL) and a separate random verification code used by the public
//! code lookup. Both resolve to this one record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::AchievementLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Active,
    Revoked,
    Expired,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    NotSent,
    Sent,
    Failed,
}

/// Which public key a verification came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    CertificateId,
    VerificationCode,
}

/// One successful verification lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub verified_at: DateTime<Utc>,
    /// Caller's user ID, or "public"
    pub verified_by: String,
    pub source_address: String,
    pub lookup: LookupKey,
}

/// One email send attempt (successful or not).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAttempt {
    pub attempted_at: DateTime<Utc>,
    pub recipient: String,
    /// Provider message ID (on success)
    pub message_id: Option<String>,
    pub status: EmailStatus,
    /// Failure reason (on failure)
    pub error: Option<String>,
}

/// Stored certificate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    /// Certificate ID (also used as document ID)
    pub id: String,
    /// Source activity, set once at creation
    pub activity_id: String,
    pub student_id: String,
    /// Issuing admin's user ID
    pub issued_by: String,

    // ─── Denormalized at issuance ────────────────────────────────
    pub student_name: String,
    pub title: String,
    pub organizing_body: Option<String>,
    pub level: Option<AchievementLevel>,
    pub event_date: Option<NaiveDate>,

    // ─── Artifact ────────────────────────────────────────────────
    pub artifact_path: String,
    pub qr_path: String,
    /// Hex SHA-256 of the rendered PDF
    pub artifact_sha256: String,

    // ─── Verification keys ───────────────────────────────────────
    pub verification_code: String,
    /// URL encoded into the QR image
    pub verification_url: String,

    // ─── Lifecycle ───────────────────────────────────────────────
    pub status: CertificateStatus,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
    pub revocation_reason: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    // ─── Counters ────────────────────────────────────────────────
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub verification_count: u64,

    // ─── Append-only logs ────────────────────────────────────────
    #[serde(default)]
    pub verification_history: Vec<VerificationEvent>,
    #[serde(default)]
    pub email_status: EmailStatus,
    #[serde(default)]
    pub email_history: Vec<EmailAttempt>,
}

impl Certificate {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Status as seen by a verifier.
    ///
    /// An active certificate past `expires_at` reports `Expired` when expiry
    /// is enforced; the stored status is left untouched.
    pub fn effective_status(&self, now: DateTime<Utc>, enforce_expiry: bool) -> CertificateStatus {
        match self.status {
            CertificateStatus::Active if enforce_expiry && self.is_expired(now) => {
                CertificateStatus::Expired
            }
            status => status,
        }
    }

    /// Count a successful verification and append it to the history.
    pub fn record_verification(&mut self, event: VerificationEvent) {
        self.verification_count += 1;
        self.view_count += 1;
        self.verification_history.push(event);
    }

    /// Append an email attempt and update the summary status.
    pub fn record_email(&mut self, attempt: EmailAttempt) {
        self.email_status = attempt.status;
        self.email_history.push(attempt);
    }

    /// Revoke the certificate. Returns `false` if it was already revoked.
    pub fn revoke(&mut self, revoked_by: &str, reason: String, now: DateTime<Utc>) -> bool {
        if self.status == CertificateStatus::Revoked {
            return false;
        }
        self.status = CertificateStatus::Revoked;
        self.revoked_at = Some(now);
        self.revoked_by = Some(revoked_by.to_string());
        self.revocation_reason = Some(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn make_certificate(issued_at: DateTime<Utc>) -> Certificate {
        Certificate {
            id: "CERT_1700000000000_0A1B2C3D".to_string(),
            activity_id: "ACT_1".to_string(),
            student_id: "stu-1".to_string(),
            issued_by: "adm-1".to_string(),
            student_name: "Asha Rao".to_string(),
            title: "Hackathon Win".to_string(),
            organizing_body: Some("IEEE".to_string()),
            level: Some(AchievementLevel::National),
            event_date: None,
            artifact_path: "certificates/CERT_1/certificate.pdf".to_string(),
            qr_path: "certificates/CERT_1/qr.png".to_string(),
            artifact_sha256: String::new(),
            verification_code: "ABCDEF".to_string(),
            verification_url: "http://localhost/verify/CERT_1".to_string(),
            status: CertificateStatus::Active,
            revoked_at: None,
            revoked_by: None,
            revocation_reason: None,
            issued_at,
            expires_at: issued_at + Duration::days(365),
            view_count: 0,
            download_count: 0,
            share_count: 0,
            verification_count: 0,
            verification_history: vec![],
            email_status: EmailStatus::NotSent,
            email_history: vec![],
        }
    }

    #[test]
    fn test_effective_status_expiry() {
        let issued = Utc::now() - Duration::days(400);
        let cert = make_certificate(issued);

        assert_eq!(
            cert.effective_status(Utc::now(), true),
            CertificateStatus::Expired
        );
        assert_eq!(
            cert.effective_status(Utc::now(), false),
            CertificateStatus::Active
        );
    }

    #[test]
    fn test_revoked_stays_revoked_regardless_of_expiry() {
        let mut cert = make_certificate(Utc::now());
        assert!(cert.revoke("adm-1", "Fraudulent claim".to_string(), Utc::now()));
        assert!(!cert.revoke("adm-2", "again".to_string(), Utc::now()));

        assert_eq!(cert.revoked_by.as_deref(), Some("adm-1"));
        assert_eq!(
            cert.effective_status(Utc::now(), true),
            CertificateStatus::Revoked
        );
    }

    #[test]
    fn test_record_verification_increments_once() {
        let mut cert = make_certificate(Utc::now());
        cert.record_verification(VerificationEvent {
            verified_at: Utc::now(),
            verified_by: "public".to_string(),
            source_address: "203.0.113.7".to_string(),
            lookup: LookupKey::CertificateId,
        });

        assert_eq!(cert.verification_count, 1);
        assert_eq!(cert.view_count, 1);
        assert_eq!(cert.verification_history.len(), 1);
    }

    #[test]
    fn test_record_email_tracks_latest_outcome() {
        let mut cert = make_certificate(Utc::now());
        cert.record_email(EmailAttempt {
            attempted_at: Utc::now(),
            recipient: "a@example.edu".to_string(),
            message_id: None,
            status: EmailStatus::Failed,
            error: Some("timeout".to_string()),
        });
        cert.record_email(EmailAttempt {
            attempted_at: Utc::now(),
            recipient: "a@example.edu".to_string(),
            message_id: Some("<msg-1>".to_string()),
            status: EmailStatus::Sent,
            error: None,
        });

        assert_eq!(cert.email_status, EmailStatus::Sent);
        assert_eq!(cert.email_history.len(), 2);
    }
}
