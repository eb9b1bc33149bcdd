// service/skill_service.rs
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{skilldb::SkillExt, userdb::UserExt, MarketplaceDb},
    dtos::skilldtos::SubmitSkillDto,
    models::skillmodel::{NewSkillSubmission, SkillSubmission, SubmissionDecision, SubmissionOutcome},
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct SkillService {
    db_client: Arc<dyn MarketplaceDb>,
}

impl SkillService {
    pub fn new(db_client: Arc<dyn MarketplaceDb>) -> Self {
        Self { db_client }
    }

    /// Every call creates a new pending row; repeated submissions are kept.
    pub async fn submit(
        &self,
        student_id: Uuid,
        body: SubmitSkillDto,
    ) -> Result<SkillSubmission, ServiceError> {
        if self.db_client.get_student_profile(student_id).await?.is_none() {
            return Err(ServiceError::not_found("Student profile for user", student_id));
        }

        let submission = self
            .db_client
            .create_skill_submission(NewSkillSubmission {
                student_id,
                skill_name: body.skill_name.trim().to_string(),
                proof_link: body.proof_link,
                proof_file: body.proof_file,
                description: body.description.unwrap_or_default(),
            })
            .await?;

        info!(
            "📝 Student {} submitted '{}' for review",
            student_id, submission.skill_name
        );
        Ok(submission)
    }

    pub async fn student_submissions(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<SkillSubmission>, ServiceError> {
        Ok(self.db_client.get_student_submissions(student_id).await?)
    }

    pub async fn pending(&self) -> Result<Vec<SkillSubmission>, ServiceError> {
        Ok(self.db_client.get_pending_submissions().await?)
    }

    pub async fn decide(
        &self,
        submission_id: Uuid,
        decision: SubmissionDecision,
    ) -> Result<SubmissionOutcome, ServiceError> {
        let outcome = self
            .db_client
            .decide_skill_submission(submission_id, decision)
            .await?
            .ok_or_else(|| ServiceError::not_found("Skill submission", submission_id))?;

        match &outcome {
            SubmissionOutcome::Approved(submission, profile) => info!(
                "🏅 Approved '{}' for student {} (badges: {})",
                submission.skill_name, submission.student_id, profile.badges_earned
            ),
            SubmissionOutcome::Rejected(submission) => info!(
                "Rejected '{}' for student {}",
                submission.skill_name, submission.student_id
            ),
            SubmissionOutcome::AlreadyDecided(submission) => warn!(
                "Submission {} was already {:?}; decision ignored",
                submission.id, submission.status
            ),
        }

        Ok(outcome)
    }
}
