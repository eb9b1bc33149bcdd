// service/job_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, userdb::UserExt, MarketplaceDb},
    dtos::jobdtos::{to_money, CreateJobDto, JobDetailDto, UpdateJobDto},
    models::{
        jobmodel::{Job, JobDeletion, JobStatus, JobUpdate, ModerationAction, NewJob},
        usermodel::{User, UserRole},
    },
    service::error::ServiceError,
};

/// What a viewer gets when opening the job board.
#[derive(Debug, Clone)]
pub enum BoardView {
    Jobs(Vec<Job>),
    /// Soft gate: the viewer is sent elsewhere with an explanation.
    Redirect { message: String, to: &'static str },
}

#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<dyn MarketplaceDb>,
}

impl JobService {
    pub fn new(db_client: Arc<dyn MarketplaceDb>) -> Self {
        Self { db_client }
    }

    async fn owned_job(&self, actor: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Job", job_id))?;

        if job.client_id != actor.id && !actor.is_admin() {
            warn!("User {} tried to act on job {} they do not own", actor.id, job_id);
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, job_id));
        }
        Ok(job)
    }

    /// Client jobs wait for moderation; admin jobs go straight to the board.
    pub async fn create_job(&self, actor: &User, body: CreateJobDto) -> Result<Job, ServiceError> {
        let status = match actor.role {
            Some(UserRole::Admin) => JobStatus::Open,
            Some(UserRole::Client) if actor.is_verified => JobStatus::Review,
            Some(UserRole::Client) => {
                return Err(ServiceError::Authorization(
                    "Your account must be verified before you can post jobs".to_string(),
                ))
            }
            _ => {
                return Err(ServiceError::Authorization(
                    "Only clients can post jobs".to_string(),
                ))
            }
        };

        let budget = to_money(body.budget)
            .filter(|b| *b > BigDecimal::from(0))
            .ok_or_else(|| ServiceError::Validation("Budget must be greater than zero".to_string()))?;

        let required_skills = body
            .required_skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let job = self
            .db_client
            .create_job(NewJob {
                client_id: actor.id,
                title: body.title,
                description: body.description,
                budget,
                deadline: body.deadline,
                status,
                required_skills,
            })
            .await?;

        info!("📌 Job {} created by {} in {}", job.id, actor.id, job.status.to_str());
        Ok(job)
    }

    pub async fn edit_job(
        &self,
        actor: &User,
        job_id: Uuid,
        body: UpdateJobDto,
    ) -> Result<Job, ServiceError> {
        let job = self.owned_job(actor, job_id).await?;
        if !job.status.is_editable() {
            return Err(ServiceError::Validation(format!(
                "A job that is {} can no longer be edited",
                job.status.to_str()
            )));
        }

        let budget = match body.budget {
            Some(amount) => Some(to_money(amount).filter(|b| *b > BigDecimal::from(0)).ok_or_else(|| {
                ServiceError::Validation("Budget must be greater than zero".to_string())
            })?),
            None => None,
        };

        self.db_client
            .update_job(
                job_id,
                JobUpdate {
                    title: body.title,
                    description: body.description,
                    budget,
                    deadline: body.deadline,
                },
            )
            .await?
            .ok_or_else(|| ServiceError::Validation("This job can no longer be edited".to_string()))
    }

    /// Open jobs for the board, behind the verification gate.
    pub async fn job_board(
        &self,
        viewer: &User,
        query: Option<&str>,
    ) -> Result<BoardView, ServiceError> {
        match viewer.role {
            Some(UserRole::Student) => {
                let profile = self
                    .db_client
                    .get_student_profile(viewer.id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Student profile for user", viewer.id))?;

                if !profile.is_id_verified {
                    return Ok(BoardView::Redirect {
                        message: profile.marketplace_gate().unwrap_or_default().to_string(),
                        to: "/api/student/school-id",
                    });
                }
                if let Some(message) = profile.marketplace_gate() {
                    return Ok(BoardView::Redirect {
                        message: message.to_string(),
                        to: "/api/student/skills",
                    });
                }
            }
            Some(UserRole::Client) if !viewer.is_verified => {
                return Ok(BoardView::Redirect {
                    message: "Your account is awaiting verification by an administrator"
                        .to_string(),
                    to: "/api/client/dashboard",
                });
            }
            _ => {}
        }

        Ok(BoardView::Jobs(self.db_client.get_open_jobs(query).await?))
    }

    pub async fn job_detail(&self, job_id: Uuid) -> Result<JobDetailDto, ServiceError> {
        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Job", job_id))?;
        let required_skills = self.db_client.get_job_skills(job_id).await?;

        Ok(JobDetailDto {
            is_expired: job.is_expired(Utc::now()),
            job,
            required_skills,
        })
    }

    pub async fn client_jobs(&self, client_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_jobs_by_client(client_id).await?)
    }

    pub async fn pending_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_jobs_by_status(JobStatus::Review).await?)
    }

    pub async fn moderate(
        &self,
        job_id: Uuid,
        action: ModerationAction,
    ) -> Result<Job, ServiceError> {
        match self.db_client.moderate_job(job_id, action.target_status()).await? {
            Some(job) => {
                info!("⚖️ Job {} moderated to {}", job.id, job.status.to_str());
                Ok(job)
            }
            None => {
                let job = self
                    .db_client
                    .get_job(job_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Job", job_id))?;
                Err(ServiceError::Validation(format!(
                    "Job is {} and no longer awaiting review",
                    job.status.to_str()
                )))
            }
        }
    }

    /// Deadline passed while still in review, open or assigned.
    pub async fn expired_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.get_expired_jobs(now).await?)
    }

    /// Owners and admins may delete, and only while the job carries no
    /// hire or payment history.
    pub async fn delete_job(&self, actor: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        self.owned_job(actor, job_id).await?;

        match self.db_client.delete_job(job_id).await? {
            JobDeletion::Deleted(job) => {
                info!("🗑️ Job {} deleted by {}", job.id, actor.id);
                Ok(job)
            }
            JobDeletion::Blocked(job) => {
                warn!("Refused to delete {} job {}", job.status.to_str(), job.id);
                Err(ServiceError::Validation(format!(
                    "Cannot delete a job that is {}",
                    job.status.to_str()
                )))
            }
            JobDeletion::NotFound => Err(ServiceError::not_found("Job", job_id)),
        }
    }
}
