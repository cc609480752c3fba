// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod certificate;
pub mod skills;
pub mod summary;
pub mod user;

pub use activity::{AchievementLevel, Activity, ActivityCategory, ActivityStatus, SkillTags};
pub use certificate::{Certificate, CertificateStatus, EmailStatus};
pub use skills::StudentSkills;
pub use user::{Role, User};
