// service/dashboard_service.rs
use std::sync::Arc;

use bigdecimal::ToPrimitive;
use chrono::Utc;
use sqlx::types::BigDecimal;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{
        jobdb::{ApplicationExt, JobExt},
        paymentdb::PaymentExt,
        skilldb::SkillExt,
        userdb::{SiteUpdateExt, UserExt},
        MarketplaceDb,
    },
    dtos::userdtos::{
        AdminDashboardDto, ClientDashboardDto, CreateSiteUpdateDto, DonorDashboardDto,
        StudentDashboardDto,
    },
    models::{
        jobmodel::JobStatus,
        usermodel::{Audience, SiteUpdate, User, UserRole},
    },
    service::error::ServiceError,
};

pub const RECENT_APPLICATIONS: i64 = 5;
pub const UPDATES_SHOWN: i64 = 3;
/// Shillings that count as supporting one comrade on the donor dashboard.
pub const SHILLINGS_PER_COMRADE: i64 = 500;

#[derive(Debug, Clone)]
pub struct DashboardService {
    db_client: Arc<dyn MarketplaceDb>,
}

impl DashboardService {
    pub fn new(db_client: Arc<dyn MarketplaceDb>) -> Self {
        Self { db_client }
    }

    pub async fn updates_for(&self, role: Option<UserRole>) -> Result<Vec<SiteUpdate>, ServiceError> {
        Ok(self
            .db_client
            .get_site_updates(&Audience::visible_to(role), UPDATES_SHOWN)
            .await?)
    }

    pub async fn create_site_update(
        &self,
        body: CreateSiteUpdateDto,
    ) -> Result<SiteUpdate, ServiceError> {
        let update = self
            .db_client
            .create_site_update(body.title, body.message, body.audience)
            .await?;
        info!("📣 Site update {} published to {}", update.id, update.audience.to_str());
        Ok(update)
    }

    pub async fn student(&self, student_id: Uuid) -> Result<StudentDashboardDto, ServiceError> {
        let profile = self
            .db_client
            .get_student_profile(student_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", student_id))?;

        let recent_applications = self
            .db_client
            .get_student_applications(student_id, RECENT_APPLICATIONS)
            .await?;

        let jobs = self.db_client.get_assigned_jobs(student_id).await?;
        let total_earnings = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .fold(BigDecimal::from(0), |acc, j| acc + &j.budget);
        let active_jobs = jobs
            .into_iter()
            .filter(|j| j.status == JobStatus::Assigned)
            .collect();

        Ok(StudentDashboardDto {
            profile,
            recent_applications,
            active_jobs,
            total_earnings,
            updates: self.updates_for(Some(UserRole::Student)).await?,
        })
    }

    pub async fn client(&self, client: &User) -> Result<ClientDashboardDto, ServiceError> {
        let jobs = self.db_client.get_jobs_by_client(client.id).await?;
        let active_jobs = jobs
            .iter()
            .filter(|j| matches!(j.status, JobStatus::Open | JobStatus::Assigned))
            .count();
        let completed_jobs = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count();

        Ok(ClientDashboardDto {
            pending_applicants: self.db_client.count_pending_for_client(client.id).await?,
            jobs,
            active_jobs,
            completed_jobs,
            is_verified: client.is_verified,
            updates: self.updates_for(Some(UserRole::Client)).await?,
        })
    }

    pub async fn donor(&self, donor_id: Uuid) -> Result<DonorDashboardDto, ServiceError> {
        let donations = self.db_client.get_donor_donations(donor_id).await?;
        let total_donated = donations
            .iter()
            .filter(|d| d.is_paid)
            .fold(BigDecimal::from(0), |acc, d| acc + &d.amount);
        let comrades_supported = (total_donated.clone() / BigDecimal::from(SHILLINGS_PER_COMRADE))
            .with_scale(0)
            .to_i64()
            .unwrap_or(0);

        Ok(DonorDashboardDto {
            donations,
            total_donated,
            comrades_supported,
            updates: self.updates_for(Some(UserRole::Donor)).await?,
        })
    }

    pub async fn admin(&self) -> Result<AdminDashboardDto, ServiceError> {
        Ok(AdminDashboardDto {
            total_users: self.db_client.get_user_count().await?,
            jobs_in_review: self.db_client.count_jobs_by_status(JobStatus::Review).await?,
            pending_submissions: self.db_client.get_pending_submissions().await?.len(),
            expired_jobs: self.db_client.count_expired_jobs(Utc::now()).await?,
            pending_applications: self.db_client.count_pending_applications().await?,
        })
    }
}
