//! Recruiter-facing student profile.

use chrono::Utc;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::summary::{ActivitySummary, StudentSummary};
use crate::models::{ActivityStatus, CertificateStatus, Role, StudentSkills};

/// Public profile: display fields, skill rollup and certified work.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecruiterProfile {
    pub student: StudentSummary,
    pub skills: StudentSkills,
    pub certified_activities: Vec<ActivitySummary>,
    /// Active certificate IDs, verifiable via the public lookup
    pub certificate_ids: Vec<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: RecordStore,
    enforce_expiry: bool,
}

impl ProfileService {
    pub fn new(db: RecordStore, enforce_expiry: bool) -> Self {
        Self { db, enforce_expiry }
    }

    pub async fn recruiter_profile(&self, student_id: &str) -> Result<RecruiterProfile> {
        let (user, skills, activities, certificates) = futures_util::try_join!(
            self.db.get_user(student_id),
            self.db.get_student_skills(student_id),
            self.db.activities_for_student(student_id),
            self.db.certificates_for_student(student_id),
        )?;

        let user = user
            .filter(|u| u.role == Role::Student)
            .ok_or_else(|| AppError::NotFound(format!("Student {}", student_id)))?;

        let now = Utc::now();
        let mut skills = skills.unwrap_or_default();
        skills.student_id = user.id.clone();

        Ok(RecruiterProfile {
            student: StudentSummary::from(&user),
            skills,
            certified_activities: activities
                .iter()
                .filter(|a| a.status == ActivityStatus::Certified)
                .map(ActivitySummary::from)
                .collect(),
            certificate_ids: certificates
                .into_iter()
                .filter(|c| {
                    c.effective_status(now, self.enforce_expiry) == CertificateStatus::Active
                })
                .map(|c| c.id)
                .collect(),
        })
    }
}
