// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity (achievement claim) model and its review lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle status of an activity.
///
/// Transitions only move forward: pending → approved → certified,
/// or pending → rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Approved,
    Rejected,
    Certified,
}

impl ActivityStatus {
    /// Stored string form (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Pending => "pending",
            ActivityStatus::Approved => "approved",
            ActivityStatus::Rejected => "rejected",
            ActivityStatus::Certified => "certified",
        }
    }

    /// Whether `self → next` is a legal lifecycle move.
    ///
    /// `certified → certified` is allowed: re-issuing a certificate relinks
    /// the activity without moving it backwards.
    pub fn can_transition_to(self, next: ActivityStatus) -> bool {
        use ActivityStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Certified) | (Certified, Certified)
        )
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ActivityStatus::Pending),
            "approved" => Ok(ActivityStatus::Approved),
            "rejected" => Ok(ActivityStatus::Rejected),
            "certified" => Ok(ActivityStatus::Certified),
            other => Err(format!("unknown activity status '{}'", other)),
        }
    }
}

/// Activity category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Technical,
    Cultural,
    Sports,
    Social,
    Academic,
    Leadership,
    Internship,
    Other,
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" => Ok(ActivityCategory::Technical),
            "cultural" => Ok(ActivityCategory::Cultural),
            "sports" => Ok(ActivityCategory::Sports),
            "social" => Ok(ActivityCategory::Social),
            "academic" => Ok(ActivityCategory::Academic),
            "leadership" => Ok(ActivityCategory::Leadership),
            "internship" => Ok(ActivityCategory::Internship),
            "other" => Ok(ActivityCategory::Other),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Scope of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AchievementLevel {
    #[default]
    College,
    University,
    State,
    National,
    International,
}

impl fmt::Display for AchievementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AchievementLevel::College => "College",
            AchievementLevel::University => "University",
            AchievementLevel::State => "State",
            AchievementLevel::National => "National",
            AchievementLevel::International => "International",
        };
        f.write_str(name)
    }
}

impl FromStr for AchievementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "college" => Ok(AchievementLevel::College),
            "university" => Ok(AchievementLevel::University),
            "state" => Ok(AchievementLevel::State),
            "national" => Ok(AchievementLevel::National),
            "international" => Ok(AchievementLevel::International),
            other => Err(format!("unknown achievement level '{}'", other)),
        }
    }
}

/// Free-form skill tags attached to a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillTags {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl SkillTags {
    /// Split a comma-separated form value into trimmed, non-empty tags.
    pub fn parse_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Stored activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub id: String,
    /// Owning student's user ID
    pub student_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: ActivityCategory,
    pub event_date: Option<NaiveDate>,
    pub organizing_body: Option<String>,
    pub level: Option<AchievementLevel>,
    /// Stored proof-document locations
    #[serde(default)]
    pub proof_documents: Vec<String>,
    #[serde(default)]
    pub skills: SkillTags,
    pub status: ActivityStatus,
    /// Reviewer's user ID
    pub reviewed_by: Option<String>,
    pub review_comment: Option<String>,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Most recently issued certificate
    pub certificate_id: Option<String>,
    pub certified_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

/// Rejected lifecycle move.
#[derive(Debug, thiserror::Error)]
#[error("Cannot move activity from {from} to {to}")]
pub struct TransitionError {
    pub from: ActivityStatus,
    pub to: ActivityStatus,
}

impl Activity {
    fn transition(&mut self, to: ActivityStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Faculty approval with an optional comment.
    pub fn approve(
        &mut self,
        reviewer_id: &str,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(ActivityStatus::Approved)?;
        self.reviewed_by = Some(reviewer_id.to_string());
        self.review_comment = comment;
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Faculty rejection with a reason.
    pub fn reject(
        &mut self,
        reviewer_id: &str,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(ActivityStatus::Rejected)?;
        self.reviewed_by = Some(reviewer_id.to_string());
        self.review_comment = Some(reason.clone());
        self.rejection_reason = Some(reason);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Link an issued certificate.
    pub fn mark_certified(
        &mut self,
        certificate_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(ActivityStatus::Certified)?;
        self.certificate_id = Some(certificate_id.to_string());
        self.certified_at = Some(now);
        Ok(())
    }

    /// Whether a certificate may be issued from this activity.
    pub fn is_certifiable(&self) -> bool {
        self.status.can_transition_to(ActivityStatus::Certified)
    }
}
