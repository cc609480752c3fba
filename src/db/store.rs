// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (read-only profiles provisioned elsewhere)
//! - Activities (submissions and their review lifecycle)
//! - Certificates (issued credentials, looked up by ID or verification code)
//! - Student skills (per-student rollups)

use std::sync::Arc;

use crate::db::collections;
use crate::db::firestore::FirestoreBackend;
use crate::db::memory::MemoryBackend;
use crate::error::AppError;
use crate::models::{Activity, ActivityStatus, Certificate, SkillTags, StudentSkills, User};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreBackend),
    Memory(Arc<MemoryBackend>),
}

/// Record store client.
#[derive(Clone)]
pub struct RecordStore {
    backend: Backend,
}

impl RecordStore {
    /// Connect to Firestore (or the emulator if FIRESTORE_EMULATOR_HOST is set).
    pub async fn connect_firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreBackend::connect(project_id).await?),
        })
    }

    /// Create an empty in-process store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryBackend::new())),
        }
    }

    // ─── Generic dispatch ────────────────────────────────────────

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.get(collection, id).await,
            Backend::Memory(mem) => mem.get(collection, id),
        }
    }

    async fn put<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.put(collection, id, doc).await,
            Backend::Memory(mem) => mem.put(collection, id, doc),
        }
    }

    async fn find_by<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.find_by(collection, field, value).await,
            Backend::Memory(mem) => mem.find_by(collection, field, value),
        }
    }

    async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.list(collection).await,
            Backend::Memory(mem) => mem.list(collection),
        }
    }

    async fn update<T, F>(&self, collection: &str, id: &str, apply: F) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnMut(&mut T) -> Result<(), AppError> + Send,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.update(collection, id, apply).await,
            Backend::Memory(mem) => mem.update(collection, id, apply),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id).await
    }

    /// Create or replace a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.put(collections::USERS, &user.id, user).await
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        self.get(collections::ACTIVITIES, activity_id).await
    }

    pub async fn put_activity(&self, activity: &Activity) -> Result<(), AppError> {
        self.put(collections::ACTIVITIES, &activity.id, activity).await
    }

    /// Apply a lifecycle change to an activity atomically.
    ///
    /// Returns the updated activity, or `None` if it does not exist.
    /// `apply` may run more than once if the write contends.
    pub async fn update_activity<F>(
        &self,
        activity_id: &str,
        apply: F,
    ) -> Result<Option<Activity>, AppError>
    where
        F: FnMut(&mut Activity) -> Result<(), AppError> + Send,
    {
        self.update(collections::ACTIVITIES, activity_id, apply).await
    }

    /// A student's activities, newest submission first.
    pub async fn activities_for_student(&self, student_id: &str) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self
            .find_by(collections::ACTIVITIES, "student_id", student_id)
            .await?;
        activities.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(activities)
    }

    /// Activities in one lifecycle status, oldest submission first (review queue order).
    pub async fn activities_with_status(
        &self,
        status: ActivityStatus,
    ) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self
            .find_by(collections::ACTIVITIES, "status", status.as_str())
            .await?;
        activities.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(activities)
    }

    /// Every activity, newest submission first.
    pub async fn all_activities(&self) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self.list(collections::ACTIVITIES).await?;
        activities.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(activities)
    }

    // ─── Certificate Operations ──────────────────────────────────

    pub async fn get_certificate(&self, certificate_id: &str) -> Result<Option<Certificate>, AppError> {
        self.get(collections::CERTIFICATES, certificate_id).await
    }

    /// Look up a certificate by its public verification code.
    pub async fn certificate_by_code(&self, code: &str) -> Result<Option<Certificate>, AppError> {
        let mut matches: Vec<Certificate> = self
            .find_by(collections::CERTIFICATES, "verification_code", code)
            .await?;

        if matches.len() > 1 {
            tracing::error!(
                count = matches.len(),
                "Verification code shared by multiple certificates"
            );
            return Err(AppError::Database(
                "Verification code is not unique".to_string(),
            ));
        }
        Ok(matches.pop())
    }

    pub async fn certificates_for_activity(
        &self,
        activity_id: &str,
    ) -> Result<Vec<Certificate>, AppError> {
        self.find_by(collections::CERTIFICATES, "activity_id", activity_id)
            .await
    }

    /// A student's certificates, newest first.
    pub async fn certificates_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Certificate>, AppError> {
        let mut certificates: Vec<Certificate> = self
            .find_by(collections::CERTIFICATES, "student_id", student_id)
            .await?;
        certificates.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(certificates)
    }

    pub async fn create_certificate(&self, certificate: &Certificate) -> Result<(), AppError> {
        self.put(collections::CERTIFICATES, &certificate.id, certificate)
            .await
    }

    /// Read-modify-write a certificate (counters, logs, status).
    pub async fn update_certificate<F>(
        &self,
        certificate_id: &str,
        apply: F,
    ) -> Result<Option<Certificate>, AppError>
    where
        F: FnMut(&mut Certificate) -> Result<(), AppError> + Send,
    {
        self.update(collections::CERTIFICATES, certificate_id, apply)
            .await
    }

    // ─── Student Skills Operations ───────────────────────────────

    pub async fn get_student_skills(&self, student_id: &str) -> Result<Option<StudentSkills>, AppError> {
        self.get(collections::STUDENT_SKILLS, student_id).await
    }

    /// Fold a submission's tags into the student's rollup, creating it if needed.
    pub async fn apply_skill_tags(
        &self,
        student_id: &str,
        tags: &SkillTags,
    ) -> Result<StudentSkills, AppError> {
        let now = chrono::Utc::now();
        let owner = student_id.to_string();
        let apply = move |skills: &mut StudentSkills| {
            skills.student_id = owner.clone();
            skills.update_from_tags(tags, now);
        };

        match &self.backend {
            Backend::Firestore(fs) => {
                fs.upsert(collections::STUDENT_SKILLS, student_id, apply)
                    .await
            }
            Backend::Memory(mem) => mem.upsert(collections::STUDENT_SKILLS, student_id, apply),
        }
    }
}
