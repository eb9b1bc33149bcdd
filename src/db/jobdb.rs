// db/jobdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    jobmodel::{
        Application, ApplicationInsert, ApplicationStatus, ApplyOutcome, HireOutcome, Job,
        JobDeletion, JobStatus, JobUpdate, NewApplication, NewJob, RejectOutcome,
    },
    skillmodel::Skill,
};

#[async_trait]
pub trait JobExt {
    /// Inserts the job and links its required skills, creating unknown skill
    /// names on the way.
    async fn create_job(&self, new_job: NewJob) -> Result<Job, sqlx::Error>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error>;

    async fn get_job_skills(&self, job_id: Uuid) -> Result<Vec<Skill>, sqlx::Error>;

    /// Applies the update only while the job is still in review or open.
    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, sqlx::Error>;

    async fn get_open_jobs(&self, query: Option<&str>) -> Result<Vec<Job>, sqlx::Error>;

    async fn get_jobs_by_client(&self, client_id: Uuid) -> Result<Vec<Job>, sqlx::Error>;

    async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, sqlx::Error>;

    async fn get_assigned_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, sqlx::Error>;

    async fn get_expired_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, sqlx::Error>;

    /// Moves a job out of `review`. Returns `None` if the job is missing or
    /// has already left review.
    async fn moderate_job(
        &self,
        job_id: Uuid,
        target: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<JobDeletion, sqlx::Error>;

    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<i64, sqlx::Error>;

    async fn count_expired_jobs(&self, now: DateTime<Utc>) -> Result<i64, sqlx::Error>;
}

#[async_trait]
pub trait ApplicationExt {
    /// Inserts the application only while the job is open. A repeat for the
    /// same (job, student) pair hands back the existing row.
    async fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationInsert, sqlx::Error>;

    async fn get_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, sqlx::Error>;

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, sqlx::Error>;

    async fn get_student_applications(
        &self,
        student_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Application>, sqlx::Error>;

    async fn get_pending_applications(&self) -> Result<Vec<Application>, sqlx::Error>;

    async fn count_pending_for_client(&self, client_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn count_pending_applications(&self) -> Result<i64, sqlx::Error>;

    /// Accepts one application, rejects every other pending application for
    /// the same job and assigns the job, all in one transaction.
    async fn hire_application(&self, application_id: Uuid) -> Result<HireOutcome, sqlx::Error>;

    async fn reject_application(&self, application_id: Uuid)
        -> Result<RejectOutcome, sqlx::Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (client_id, title, description, budget, deadline, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_job.client_id)
        .bind(new_job.title)
        .bind(new_job.description)
        .bind(new_job.budget)
        .bind(new_job.deadline)
        .bind(new_job.status)
        .fetch_one(&mut *tx)
        .await?;

        for name in new_job.required_skills {
            let skill_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO skills (name)
                VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO job_required_skills (job_id, skill_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(job.id)
            .bind(skill_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_job_skills(&self, job_id: Uuid) -> Result<Vec<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            SELECT s.* FROM skills s
            JOIN job_required_skills jrs ON jrs.skill_id = s.id
            WHERE jrs.job_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                budget = COALESCE($4, budget),
                deadline = COALESCE($5, deadline),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('review'::job_status, 'open'::job_status)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.budget)
        .bind(update.deadline)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_open_jobs(&self, query: Option<&str>) -> Result<Vec<Job>, sqlx::Error> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                sqlx::query_as::<_, Job>(
                    r#"
                    SELECT * FROM jobs
                    WHERE status = 'open'::job_status AND title ILIKE $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(format!("%{}%", q))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Job>(
                    r#"
                    SELECT * FROM jobs
                    WHERE status = 'open'::job_status
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn get_jobs_by_client(&self, client_id: Uuid) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"SELECT * FROM jobs WHERE client_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE status = $1 ORDER BY created_at DESC"#)
            .bind(status)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_assigned_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"SELECT * FROM jobs WHERE assigned_to = $1 ORDER BY updated_at DESC"#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_expired_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE deadline < $1
              AND status IN ('review'::job_status, 'open'::job_status, 'assigned'::job_status)
            ORDER BY deadline
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    async fn moderate_job(
        &self,
        job_id: Uuid,
        target: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'review'::job_status
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(target)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<JobDeletion, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1 FOR UPDATE"#)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(JobDeletion::NotFound);
        };

        if !job.status.is_deletable() {
            tx.rollback().await?;
            return Ok(JobDeletion::Blocked(job));
        }

        sqlx::query(r#"DELETE FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(JobDeletion::Deleted(job))
    }

    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM jobs WHERE status = $1"#)
            .bind(status)
            .fetch_one(&self.pool)
            .await
    }

    async fn count_expired_jobs(&self, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM jobs
            WHERE deadline < $1
              AND status IN ('review'::job_status, 'open'::job_status, 'assigned'::job_status)
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl ApplicationExt for DBClient {
    async fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationInsert, sqlx::Error> {
        let job_id = application.job_id;
        let student_id = application.student_id;
        let mut tx = self.pool.begin().await?;

        // FOR SHARE conflicts with the FOR UPDATE taken by hire_application
        let job = sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1 FOR SHARE"#)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(ApplicationInsert::JobNotFound);
        };

        if job.status != JobStatus::Open || job.assigned_to.is_some() {
            tx.rollback().await?;
            return Ok(ApplicationInsert::JobNotOpen(job));
        }

        // the (job_id, student_id) constraint decides concurrent duplicates
        let created = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (job_id, student_id, proposal, bid_amount, cv_file, cover_letter_file)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id, student_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(application.job_id)
        .bind(application.student_id)
        .bind(application.proposal)
        .bind(application.bid_amount)
        .bind(application.cv_file)
        .bind(application.cover_letter_file)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match created {
            Some(created) => ApplyOutcome::Created(created),
            None => {
                let existing = sqlx::query_as::<_, Application>(
                    r#"SELECT * FROM applications WHERE job_id = $1 AND student_id = $2"#,
                )
                .bind(job_id)
                .bind(student_id)
                .fetch_one(&mut *tx)
                .await?;
                ApplyOutcome::AlreadyApplied(existing)
            }
        };

        tx.commit().await?;
        Ok(ApplicationInsert::Applied(outcome))
    }

    async fn get_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at"#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_student_applications(
        &self,
        student_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE student_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_pending_applications(&self) -> Result<Vec<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE status = 'pending'::application_status
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn count_pending_for_client(&self, client_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.client_id = $1 AND a.status = 'pending'::application_status
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_pending_applications(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM applications WHERE status = 'pending'::application_status"#,
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn hire_application(&self, application_id: Uuid) -> Result<HireOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE id = $1"#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(application) = application else {
            tx.rollback().await?;
            return Ok(HireOutcome::NotFound);
        };

        // the job row lock serialises concurrent hires for the same job
        let job = sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1 FOR UPDATE"#)
            .bind(application.job_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(HireOutcome::NotFound);
        };

        // lock the row too; a reject does not take the job lock
        let application = sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE id = $1 FOR UPDATE"#,
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;

        if application.status != ApplicationStatus::Pending {
            tx.rollback().await?;
            return Ok(HireOutcome::ApplicationNotPending(application));
        }

        if job.status != JobStatus::Open || job.assigned_to.is_some() {
            tx.rollback().await?;
            return Ok(HireOutcome::JobNotOpen(job));
        }

        let accepted = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = 'accepted'::application_status, decided_at = NOW()
            WHERE id = $1 AND status = 'pending'::application_status
            RETURNING *
            "#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(application) = accepted else {
            tx.rollback().await?;
            let current = self.get_application(application_id).await?;
            return Ok(match current {
                Some(application) => HireOutcome::ApplicationNotPending(application),
                None => HireOutcome::NotFound,
            });
        };

        let rivals_rejected = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'rejected'::application_status, decided_at = NOW()
            WHERE job_id = $1 AND id <> $2 AND status = 'pending'::application_status
            "#,
        )
        .bind(job.id)
        .bind(application_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET assigned_to = $2, status = 'assigned'::job_status, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(application.student_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(HireOutcome::Hired {
            job,
            application,
            rivals_rejected,
        })
    }

    async fn reject_application(
        &self,
        application_id: Uuid,
    ) -> Result<RejectOutcome, sqlx::Error> {
        let rejected = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = 'rejected'::application_status, decided_at = NOW()
            WHERE id = $1 AND status = 'pending'::application_status
            RETURNING *
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(rejected) = rejected {
            return Ok(RejectOutcome::Rejected(rejected));
        }

        let existing = self.get_application(application_id).await?;
        Ok(match existing {
            Some(application) => RejectOutcome::ApplicationNotPending(application),
            None => RejectOutcome::NotFound,
        })
    }
}
