// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity submission and review service.
//!
//! Handles the core workflow:
//! 1. Student submits a claim (with optional proof document)
//! 2. Skill tags are folded into the student's rollup immediately
//! 3. Faculty approve or reject the pending claim
//!
//! Certification is handled by [`crate::services::issuer`].

use chrono::{NaiveDate, Utc};
use validator::{Validate, ValidationError};

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::{
    AchievementLevel, Activity, ActivityCategory, ActivityStatus, SkillTags,
};
use crate::services::ids;
use crate::services::storage::ArtifactStore;

const MAX_TAG_LEN: usize = 50;

// validator passes the field by reference to its concrete type.
#[allow(clippy::ptr_arg)]
fn validate_tag_lengths(tags: &Vec<String>) -> std::result::Result<(), ValidationError> {
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
        let mut err = ValidationError::new("tag_too_long");
        err.message = Some(format!("Each tag must be at most {} characters", MAX_TAG_LEN).into());
        return Err(err);
    }
    Ok(())
}

/// A new activity claim as submitted by a student.
#[derive(Debug, Clone, Validate)]
pub struct NewActivity {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,

    pub category: ActivityCategory,

    pub event_date: Option<NaiveDate>,

    #[validate(length(max = 200, message = "Organizing body must not exceed 200 characters"))]
    pub organizing_body: Option<String>,

    pub level: Option<AchievementLevel>,

    #[validate(
        length(max = 20, message = "At most 20 technical skills"),
        custom(function = "validate_tag_lengths")
    )]
    pub technical_skills: Vec<String>,

    #[validate(
        length(max = 20, message = "At most 20 soft skills"),
        custom(function = "validate_tag_lengths")
    )]
    pub soft_skills: Vec<String>,

    #[validate(
        length(max = 20, message = "At most 20 tools"),
        custom(function = "validate_tag_lengths")
    )]
    pub tools: Vec<String>,
}

/// Uploaded proof document.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ActivityService {
    db: RecordStore,
    artifacts: ArtifactStore,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ActivityService {
    pub fn new(db: RecordStore, artifacts: ArtifactStore) -> Self {
        Self { db, artifacts }
    }

    /// Store a new pending claim and update the student's skill rollup.
    pub async fn submit(
        &self,
        student_id: &str,
        input: NewActivity,
        proof: Option<ProofUpload>,
    ) -> Result<Activity> {
        let mut input = input;
        input.title = input.title.trim().to_string();
        input.validate()?;

        let now = Utc::now();
        let id = ids::activity_id(now)?;

        let mut proof_documents = Vec::new();
        if let Some(proof) = proof {
            let name = if proof.file_name.trim().is_empty() {
                "proof"
            } else {
                proof.file_name.as_str()
            };
            let path = self.artifacts.write_proof(&id, name, &proof.bytes).await?;
            proof_documents.push(path.to_string_lossy().into_owned());
        }

        let activity = Activity {
            id,
            student_id: student_id.to_string(),
            title: input.title,
            description: trimmed(input.description),
            category: input.category,
            event_date: input.event_date,
            organizing_body: trimmed(input.organizing_body),
            level: input.level,
            proof_documents,
            skills: SkillTags {
                technical: input.technical_skills,
                soft: input.soft_skills,
                tools: input.tools,
            },
            status: ActivityStatus::Pending,
            reviewed_by: None,
            review_comment: None,
            rejection_reason: None,
            reviewed_at: None,
            certificate_id: None,
            certified_at: None,
            submitted_at: now,
        };

        self.db.put_activity(&activity).await?;

        // The rollup counts every submission, reviewed or not.
        if let Err(e) = self.db.apply_skill_tags(student_id, &activity.skills).await {
            tracing::warn!(
                activity_id = %activity.id,
                student_id,
                error = %e,
                "Failed to update skill rollup, continuing anyway"
            );
        }

        tracing::info!(activity_id = %activity.id, student_id, "Activity submitted");
        Ok(activity)
    }

    pub async fn approve(
        &self,
        activity_id: &str,
        reviewer_id: &str,
        comment: Option<String>,
    ) -> Result<Activity> {
        let comment = trimmed(comment);
        let now = Utc::now();
        let activity = self
            .db
            .update_activity(activity_id, |a: &mut Activity| {
                a.approve(reviewer_id, comment.clone(), now)?;
                Ok(())
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        tracing::info!(activity_id, reviewer_id, "Activity approved");
        Ok(activity)
    }

    /// Reject a pending claim. A non-blank reason is required.
    pub async fn reject(
        &self,
        activity_id: &str,
        reviewer_id: &str,
        reason: &str,
    ) -> Result<Activity> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest(
                "A rejection reason is required".to_string(),
            ));
        }

        let now = Utc::now();
        let activity = self
            .db
            .update_activity(activity_id, |a: &mut Activity| {
                a.reject(reviewer_id, reason.to_string(), now)?;
                Ok(())
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        tracing::info!(activity_id, reviewer_id, "Activity rejected");
        Ok(activity)
    }

    pub async fn list_for_student(&self, student_id: &str) -> Result<Vec<Activity>> {
        self.db.activities_for_student(student_id).await
    }

    /// Review queue, oldest first.
    pub async fn pending(&self) -> Result<Vec<Activity>> {
        self.db.activities_with_status(ActivityStatus::Pending).await
    }

    pub async fn list_all(&self, status: Option<ActivityStatus>) -> Result<Vec<Activity>> {
        match status {
            Some(status) => self.db.activities_with_status(status).await,
            None => self.db.all_activities().await,
        }
    }
}
