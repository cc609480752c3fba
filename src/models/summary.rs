// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Redacted views returned to public verifiers and recruiters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::{AchievementLevel, Activity, ActivityCategory, SkillTags};
use crate::models::certificate::{Certificate, CertificateStatus};
use crate::models::user::User;
use crate::time_utils::format_utc_rfc3339;

/// Public certificate fields. Counters and logs are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CertificateSummary {
    pub certificate_id: String,
    pub student_name: String,
    pub title: String,
    pub organizing_body: Option<String>,
    pub level: Option<AchievementLevel>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub event_date: Option<NaiveDate>,
    pub status: CertificateStatus,
    pub issued_at: String,
    pub expires_at: String,
    pub artifact_sha256: String,
}

impl CertificateSummary {
    pub fn from_certificate(cert: &Certificate, status: CertificateStatus) -> Self {
        Self {
            certificate_id: cert.id.clone(),
            student_name: cert.student_name.clone(),
            title: cert.title.clone(),
            organizing_body: cert.organizing_body.clone(),
            level: cert.level,
            event_date: cert.event_date,
            status,
            issued_at: format_utc_rfc3339(cert.issued_at),
            expires_at: format_utc_rfc3339(cert.expires_at),
            artifact_sha256: cert.artifact_sha256.clone(),
        }
    }
}

/// Public activity fields (no review notes, no proof documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub activity_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: ActivityCategory,
    pub level: Option<AchievementLevel>,
    pub organizing_body: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub event_date: Option<NaiveDate>,
    pub skills: SkillTags,
}

impl From<&Activity> for ActivitySummary {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id.clone(),
            title: activity.title.clone(),
            description: activity.description.clone(),
            category: activity.category,
            level: activity.level,
            organizing_body: activity.organizing_body.clone(),
            event_date: activity.event_date,
            skills: activity.skills.clone(),
        }
    }
}

/// Public student fields. Email and credentials are never included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub roll_number: Option<String>,
    pub department: Option<String>,
}

impl From<&User> for StudentSummary {
    fn from(user: &User) -> Self {
        Self {
            student_id: user.id.clone(),
            name: user.name.clone(),
            roll_number: user.roll_number.clone(),
            department: user.department.clone(),
        }
    }
}
