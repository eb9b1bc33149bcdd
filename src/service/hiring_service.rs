// service/hiring_service.rs
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{
        jobdb::{ApplicationExt, JobExt},
        userdb::UserExt,
        MarketplaceDb,
    },
    dtos::jobdtos::{to_money, ApplyJobDto, HireResultDto, JobApplicantsDto},
    models::{
        jobmodel::{
            Application, ApplicationAction, ApplicationInsert, ApplyOutcome, HireOutcome, Job,
            NewApplication, RejectOutcome,
        },
        usermodel::User,
    },
    service::error::ServiceError,
};

/// Result of acting on an application. Acting twice is a no-op that hands
/// back the application as it already stands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Decision {
    Hired(HireResultDto),
    Rejected(Application),
    AlreadyDecided(Application),
}

#[derive(Debug, Clone)]
pub struct HiringService {
    db_client: Arc<dyn MarketplaceDb>,
}

impl HiringService {
    pub fn new(db_client: Arc<dyn MarketplaceDb>) -> Self {
        Self { db_client }
    }

    async fn job_for(&self, actor: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Job", job_id))?;

        if job.client_id != actor.id && !actor.is_admin() {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, job_id));
        }
        Ok(job)
    }

    /// Application on `job_id`, which must belong to the job in the path.
    async fn application_on(
        &self,
        job_id: Uuid,
        application_id: Uuid,
    ) -> Result<Application, ServiceError> {
        self.db_client
            .get_application(application_id)
            .await?
            .filter(|a| a.job_id == job_id)
            .ok_or_else(|| ServiceError::not_found("Application", application_id))
    }

    /// One application per (job, student); a repeat returns the existing one.
    pub async fn apply(
        &self,
        student: &User,
        job_id: Uuid,
        body: ApplyJobDto,
    ) -> Result<ApplyOutcome, ServiceError> {
        let profile = self
            .db_client
            .get_student_profile(student.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", student.id))?;
        if let Some(message) = profile.marketplace_gate() {
            return Err(ServiceError::Authorization(message.to_string()));
        }

        let insert = self
            .db_client
            .create_application(NewApplication {
                job_id,
                student_id: student.id,
                proposal: body.proposal,
                bid_amount: body.bid_amount.and_then(to_money),
                cv_file: body.cv_file,
                cover_letter_file: body.cover_letter_file,
            })
            .await?;

        let outcome = match insert {
            ApplicationInsert::Applied(outcome) => outcome,
            ApplicationInsert::JobNotOpen(job) => {
                return Err(ServiceError::Validation(format!(
                    "This job is {} and not accepting applications",
                    job.status.to_str()
                )))
            }
            ApplicationInsert::JobNotFound => return Err(ServiceError::not_found("Job", job_id)),
        };

        match &outcome {
            ApplyOutcome::Created(application) => {
                info!("📨 Student {} applied to job {}", student.id, application.job_id)
            }
            ApplyOutcome::AlreadyApplied(_) => {
                warn!("Student {} already applied to job {}", student.id, job_id)
            }
        }
        Ok(outcome)
    }

    pub async fn applicants(
        &self,
        actor: &User,
        job_id: Uuid,
    ) -> Result<JobApplicantsDto, ServiceError> {
        let job = self.job_for(actor, job_id).await?;
        let applications = self.db_client.get_job_applications(job_id).await?;
        Ok(JobApplicantsDto { job, applications })
    }

    pub async fn hire(
        &self,
        actor: &User,
        job_id: Uuid,
        application_id: Uuid,
    ) -> Result<Decision, ServiceError> {
        self.job_for(actor, job_id).await?;
        self.application_on(job_id, application_id).await?;
        self.run_hire(application_id).await
    }

    pub async fn reject(
        &self,
        actor: &User,
        job_id: Uuid,
        application_id: Uuid,
    ) -> Result<Decision, ServiceError> {
        self.job_for(actor, job_id).await?;
        self.application_on(job_id, application_id).await?;
        self.run_reject(application_id).await
    }

    /// Admin shortcut from the pending-applications queue.
    pub async fn admin_process(
        &self,
        application_id: Uuid,
        action: ApplicationAction,
    ) -> Result<Decision, ServiceError> {
        match action {
            ApplicationAction::Hire => self.run_hire(application_id).await,
            ApplicationAction::Reject => self.run_reject(application_id).await,
        }
    }

    pub async fn pending_applications(&self) -> Result<Vec<Application>, ServiceError> {
        Ok(self.db_client.get_pending_applications().await?)
    }

    async fn run_hire(&self, application_id: Uuid) -> Result<Decision, ServiceError> {
        match self.db_client.hire_application(application_id).await? {
            HireOutcome::Hired {
                job,
                application,
                rivals_rejected,
            } => {
                info!(
                    "🤝 Student {} hired for job {} ({} other applicants rejected)",
                    application.student_id, job.id, rivals_rejected
                );
                Ok(Decision::Hired(HireResultDto {
                    job,
                    application,
                    rivals_rejected,
                }))
            }
            HireOutcome::ApplicationNotPending(application) => {
                warn!("Application {} was already decided", application.id);
                Ok(Decision::AlreadyDecided(application))
            }
            HireOutcome::JobNotOpen(job) => Err(ServiceError::Validation(format!(
                "Job is {} and can no longer take a hire",
                job.status.to_str()
            ))),
            HireOutcome::NotFound => Err(ServiceError::not_found("Application", application_id)),
        }
    }

    async fn run_reject(&self, application_id: Uuid) -> Result<Decision, ServiceError> {
        match self.db_client.reject_application(application_id).await? {
            RejectOutcome::Rejected(application) => {
                info!("Application {} rejected", application.id);
                Ok(Decision::Rejected(application))
            }
            RejectOutcome::ApplicationNotPending(application) => {
                warn!("Application {} was already decided", application.id);
                Ok(Decision::AlreadyDecided(application))
            }
            RejectOutcome::NotFound => Err(ServiceError::not_found("Application", application_id)),
        }
    }
}
