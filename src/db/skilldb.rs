// db/skilldb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    skillmodel::{
        NewSkillSubmission, Skill, SkillSubmission, SubmissionDecision, SubmissionOutcome,
        SubmissionStatus,
    },
    usermodel::StudentProfile,
};

#[async_trait]
pub trait SkillExt {
    async fn create_skill_submission(
        &self,
        submission: NewSkillSubmission,
    ) -> Result<SkillSubmission, sqlx::Error>;

    async fn get_skill_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SkillSubmission>, sqlx::Error>;

    async fn get_student_submissions(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<SkillSubmission>, sqlx::Error>;

    async fn get_pending_submissions(&self) -> Result<Vec<SkillSubmission>, sqlx::Error>;

    /// Applies an admin decision. Approval grants the named skill (creating it
    /// if needed), marks the student skill-verified and awards one badge, all
    /// in the same transaction as the status change. Returns `None` when the
    /// submission does not exist.
    async fn decide_skill_submission(
        &self,
        submission_id: Uuid,
        decision: SubmissionDecision,
    ) -> Result<Option<SubmissionOutcome>, sqlx::Error>;

    async fn get_profile_skills(&self, profile_id: Uuid) -> Result<Vec<Skill>, sqlx::Error>;
}

#[async_trait]
impl SkillExt for DBClient {
    async fn create_skill_submission(
        &self,
        submission: NewSkillSubmission,
    ) -> Result<SkillSubmission, sqlx::Error> {
        sqlx::query_as::<_, SkillSubmission>(
            r#"
            INSERT INTO skill_submissions (student_id, skill_name, proof_link, proof_file, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(submission.student_id)
        .bind(submission.skill_name)
        .bind(submission.proof_link)
        .bind(submission.proof_file)
        .bind(submission.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_skill_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SkillSubmission>, sqlx::Error> {
        sqlx::query_as::<_, SkillSubmission>(r#"SELECT * FROM skill_submissions WHERE id = $1"#)
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_student_submissions(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<SkillSubmission>, sqlx::Error> {
        sqlx::query_as::<_, SkillSubmission>(
            r#"
            SELECT * FROM skill_submissions
            WHERE student_id = $1
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_pending_submissions(&self) -> Result<Vec<SkillSubmission>, sqlx::Error> {
        sqlx::query_as::<_, SkillSubmission>(
            r#"
            SELECT * FROM skill_submissions
            WHERE status = 'pending'::submission_status
            ORDER BY submitted_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn decide_skill_submission(
        &self,
        submission_id: Uuid,
        decision: SubmissionDecision,
    ) -> Result<Option<SubmissionOutcome>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let submission = sqlx::query_as::<_, SkillSubmission>(
            r#"SELECT * FROM skill_submissions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(submission_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(submission) = submission else {
            tx.rollback().await?;
            return Ok(None);
        };

        if submission.status != SubmissionStatus::Pending {
            tx.rollback().await?;
            return Ok(Some(SubmissionOutcome::AlreadyDecided(submission)));
        }

        let new_status = match decision {
            SubmissionDecision::Approve => SubmissionStatus::Approved,
            SubmissionDecision::Reject => SubmissionStatus::Rejected,
        };

        let decided = sqlx::query_as::<_, SkillSubmission>(
            r#"
            UPDATE skill_submissions
            SET status = $2, decided_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(new_status)
        .fetch_one(&mut *tx)
        .await?;

        if decision == SubmissionDecision::Reject {
            tx.commit().await?;
            return Ok(Some(SubmissionOutcome::Rejected(decided)));
        }

        // no-op update so RETURNING yields the existing row on conflict
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(&decided.skill_name)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET is_skill_verified = TRUE, badges_earned = badges_earned + 1
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(decided.student_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(profile) = profile else {
            // approving a submission for an account without a profile is a data error
            tx.rollback().await?;
            return Err(sqlx::Error::RowNotFound);
        };

        sqlx::query(
            r#"
            INSERT INTO student_skills (profile_id, skill_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(profile.id)
        .bind(skill.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(SubmissionOutcome::Approved(decided, profile)))
    }

    async fn get_profile_skills(&self, profile_id: Uuid) -> Result<Vec<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            SELECT s.* FROM skills s
            JOIN student_skills ss ON ss.skill_id = s.id
            WHERE ss.profile_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
    }
}
