use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Review,
    Open,
    Assigned,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Review => "review",
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Assigned and completed jobs keep their payment linkage and cannot be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, JobStatus::Review | JobStatus::Open | JobStatus::Cancelled)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, JobStatus::Review | JobStatus::Open)
    }

    /// Statuses in which a passed deadline counts as expired.
    pub fn can_expire(&self) -> bool {
        matches!(self, JobStatus::Review | JobStatus::Open | JobStatus::Assigned)
    }
}

pub const DELETABLE_STATUSES: [JobStatus; 3] =
    [JobStatus::Review, JobStatus::Open, JobStatus::Cancelled];

pub const EXPIRABLE_STATUSES: [JobStatus; 3] =
    [JobStatus::Review, JobStatus::Open, JobStatus::Assigned];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub budget: BigDecimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Expiry is derived, never stored: a deadline in the past while the job
    /// is still in review, open or assigned.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => deadline < now && self.status.can_expire(),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: BigDecimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub required_skills: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<BigDecimal>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub proposal: String,
    pub bid_amount: Option<BigDecimal>,
    pub cv_file: Option<String>,
    pub cover_letter_file: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ApplicationStatus::Accepted
    }

    pub fn is_rejected(&self) -> bool {
        self.status == ApplicationStatus::Rejected
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub proposal: String,
    pub bid_amount: Option<BigDecimal>,
    pub cv_file: Option<String>,
    pub cover_letter_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationAction {
    Hire,
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn target_status(&self) -> JobStatus {
        match self {
            ModerationAction::Approve => JobStatus::Open,
            ModerationAction::Reject => JobStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    Created(Application),
    /// The (job, student) pair already had an application; it is returned untouched.
    AlreadyApplied(Application),
}

/// Storage result of an apply. The job's status is checked under its row
/// lock, so a concurrent hire either sees the new row or blocks it.
#[derive(Debug, Clone)]
pub enum ApplicationInsert {
    Applied(ApplyOutcome),
    JobNotOpen(Job),
    JobNotFound,
}

#[derive(Debug, Clone)]
pub enum HireOutcome {
    Hired {
        job: Job,
        application: Application,
        rivals_rejected: u64,
    },
    /// The application was already accepted or rejected.
    ApplicationNotPending(Application),
    /// Someone else was hired first, or the job never reached `open`.
    JobNotOpen(Job),
    NotFound,
}

#[derive(Debug, Clone)]
pub enum RejectOutcome {
    Rejected(Application),
    ApplicationNotPending(Application),
    NotFound,
}

#[derive(Debug, Clone)]
pub enum JobDeletion {
    Deleted(Job),
    Blocked(Job),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job_with(status: JobStatus, deadline: Option<DateTime<Utc>>) -> Job {
        Job {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            assigned_to: None,
            title: "Logo design".to_string(),
            description: "Design a logo".to_string(),
            budget: BigDecimal::from(1500),
            deadline,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_deletion_guard() {
        assert!(JobStatus::Review.is_deletable());
        assert!(JobStatus::Open.is_deletable());
        assert!(JobStatus::Cancelled.is_deletable());
        assert!(!JobStatus::Assigned.is_deletable());
        assert!(!JobStatus::Completed.is_deletable());
    }

    #[test]
    fn test_expiry_is_derived_from_deadline_and_status() {
        let now = Utc::now();
        let past = Some(now - Duration::days(1));
        let future = Some(now + Duration::days(1));

        assert!(job_with(JobStatus::Open, past).is_expired(now));
        assert!(job_with(JobStatus::Review, past).is_expired(now));
        assert!(job_with(JobStatus::Assigned, past).is_expired(now));
        assert!(!job_with(JobStatus::Completed, past).is_expired(now));
        assert!(!job_with(JobStatus::Cancelled, past).is_expired(now));
        assert!(!job_with(JobStatus::Open, future).is_expired(now));
        assert!(!job_with(JobStatus::Open, None).is_expired(now));
    }

    #[test]
    fn test_moderation_targets() {
        assert_eq!(ModerationAction::Approve.target_status(), JobStatus::Open);
        assert_eq!(ModerationAction::Reject.target_status(), JobStatus::Cancelled);
    }
}
