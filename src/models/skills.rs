//! Per-student skill rollup for recruiter profiles.
//!
//! Updated additively on every activity submission (not on approval), so
//! pending and rejected claims also count towards the rollup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::SkillTags;

const TECHNICAL_WEIGHT: u32 = 10;
const SOFT_WEIGHT: u32 = 8;
const TOOL_WEIGHT: u32 = 6;
const MAX_SCORE: u32 = 100;

/// Technical or soft skill with endorsement count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillEntry {
    pub name: String,
    pub frequency: u32,
    #[serde(default)]
    pub endorsements: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ToolEntry {
    pub name: String,
    pub frequency: u32,
}

/// Skill rollup for one student.
///
/// Stored in `student_skills`, keyed by student ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudentSkills {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub technical: Vec<SkillEntry>,
    #[serde(default)]
    pub soft: Vec<SkillEntry>,
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
    /// min(100, 10·technical + 8·soft + 6·tools), over distinct names
    #[serde(default)]
    pub overall_score: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StudentSkills {
    /// Fold one submission's tags into the rollup.
    ///
    /// Names match case-insensitively; the first spelling seen is kept.
    pub fn update_from_tags(&mut self, tags: &SkillTags, now: DateTime<Utc>) {
        for name in &tags.technical {
            bump_skill(&mut self.technical, name);
        }
        for name in &tags.soft {
            bump_skill(&mut self.soft, name);
        }
        for name in &tags.tools {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            match self
                .tools
                .iter_mut()
                .find(|t| t.name.eq_ignore_ascii_case(name))
            {
                Some(entry) => entry.frequency += 1,
                None => self.tools.push(ToolEntry {
                    name: name.to_string(),
                    frequency: 1,
                }),
            }
        }

        self.overall_score = compute_score(self.technical.len(), self.soft.len(), self.tools.len());
        self.updated_at = Some(now);
    }

    pub fn technical_frequency(&self, name: &str) -> u32 {
        self.technical
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map_or(0, |s| s.frequency)
    }
}

fn bump_skill(entries: &mut Vec<SkillEntry>, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    match entries
        .iter_mut()
        .find(|s| s.name.eq_ignore_ascii_case(name))
    {
        Some(entry) => entry.frequency += 1,
        None => entries.push(SkillEntry {
            name: name.to_string(),
            frequency: 1,
            endorsements: 0,
        }),
    }
}

/// Distinct-skill score, capped at 100.
pub fn compute_score(technical: usize, soft: usize, tools: usize) -> u32 {
    let raw = TECHNICAL_WEIGHT as usize * technical
        + SOFT_WEIGHT as usize * soft
        + TOOL_WEIGHT as usize * tools;
    raw.min(MAX_SCORE as usize) as u32
}
