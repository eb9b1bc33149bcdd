use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::StudentProfile;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub icon_class: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct SkillSubmission {
    pub id: Uuid,
    pub student_id: Uuid,
    pub skill_name: String,
    pub proof_link: Option<String>,
    pub proof_file: Option<String>,
    pub description: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSkillSubmission {
    pub student_id: Uuid,
    pub skill_name: String,
    pub proof_link: Option<String>,
    pub proof_file: Option<String>,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionDecision {
    Approve,
    Reject,
}

/// Result of an admin decision on a skill submission.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Approved: the student's profile after the skill grant.
    Approved(SkillSubmission, StudentProfile),
    Rejected(SkillSubmission),
    /// The submission had already been decided; nothing changed.
    AlreadyDecided(SkillSubmission),
}
