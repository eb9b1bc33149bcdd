// db/memory.rs
//
// In-memory storage used by the service and router tests. Each trait method
// holds the state lock for its whole body, which gives it the same
// all-or-nothing behaviour as the transactional Postgres implementation.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    jobdb::{ApplicationExt, JobExt},
    paymentdb::PaymentExt,
    skilldb::SkillExt,
    userdb::{SiteUpdateExt, UserExt, USERS_EMAIL_KEY, USERS_USERNAME_KEY},
};
use crate::models::{
    jobmodel::{
        Application, ApplicationInsert, ApplicationStatus, ApplyOutcome, HireOutcome, Job,
        JobDeletion, JobStatus, JobUpdate, NewApplication, NewJob, RejectOutcome,
    },
    paymentmodel::{
        CallbackOutcome, Donation, NewDonation, NewJobPayment, Payment, PaymentPurpose,
        PaymentStatus, StkCallback,
    },
    skillmodel::{
        NewSkillSubmission, Skill, SkillSubmission, SubmissionDecision, SubmissionOutcome,
        SubmissionStatus,
    },
    usermodel::{
        Audience, NewStudentProfile, NewUser, SiteUpdate, StudentProfile, StudentProfileUpdate,
        User, UserRole,
    },
};

/// Stand-in for the driver error Postgres raises on a unique constraint.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"{constraint}\"")]
pub struct UniqueViolation {
    constraint: &'static str,
}

impl UniqueViolation {
    pub fn error(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
    }
}

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    profiles: Vec<StudentProfile>,
    skills: Vec<Skill>,
    student_skills: Vec<(Uuid, Uuid)>,
    submissions: Vec<SkillSubmission>,
    jobs: Vec<Job>,
    job_skills: Vec<(Uuid, Uuid)>,
    applications: Vec<Application>,
    donations: Vec<Donation>,
    payments: Vec<Payment>,
    updates: Vec<SiteUpdate>,
}

impl MemoryState {
    fn insert_user(&mut self, new_user: NewUser) -> Result<User, sqlx::Error> {
        if self.users.iter().any(|u| u.email == new_user.email) {
            return Err(UniqueViolation::error(USERS_EMAIL_KEY));
        }
        if self.users.iter().any(|u| u.username == new_user.username) {
            return Err(UniqueViolation::error(USERS_USERNAME_KEY));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            name: new_user.name,
            password: Some(new_user.password),
            phone_number: new_user.phone_number,
            role: new_user.role,
            is_verified: new_user.is_verified,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn insert_profile(&mut self, user_id: Uuid, profile: NewStudentProfile) -> StudentProfile {
        let profile = StudentProfile {
            id: Uuid::new_v4(),
            user_id,
            university: profile.university,
            course: profile.course,
            year_of_study: profile.year_of_study,
            badges_earned: 0,
            is_skill_verified: false,
            school_id_document: None,
            is_id_verified: false,
            id_rejection_reason: None,
            created_at: Utc::now(),
        };
        self.profiles.push(profile.clone());
        profile
    }

    fn skill_id_for(&mut self, name: &str) -> Uuid {
        if let Some(skill) = self.skills.iter().find(|s| s.name == name) {
            return skill.id;
        }
        let skill = Skill {
            id: Uuid::new_v4(),
            name: name.to_string(),
            icon_class: "bi-star-fill".to_string(),
        };
        let id = skill.id;
        self.skills.push(skill);
        id
    }

    fn profile_mut(&mut self, user_id: Uuid) -> Option<&mut StudentProfile> {
        self.profiles.iter_mut().find(|p| p.user_id == user_id)
    }

    fn user_mut(&mut self, user_id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    fn job_mut(&mut self, job_id: Uuid) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == job_id)
    }

    fn payment_mut(&mut self, payment_id: Uuid) -> Option<&mut Payment> {
        self.payments.iter_mut().find(|p| p.id == payment_id)
    }
}

fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    items.rev().collect()
}

#[derive(Debug, Default)]
pub struct MemoryDb {
    state: Mutex<MemoryState>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of application rows for a (job, student) pair.
    pub async fn application_count(&self, job_id: Uuid, student_id: Uuid) -> usize {
        let state = self.state.lock().await;
        state
            .applications
            .iter()
            .filter(|a| a.job_id == job_id && a.student_id == student_id)
            .count()
    }

    /// Test hook for putting a job into an arbitrary state.
    pub async fn force_job_status(&self, job_id: Uuid, status: JobStatus) {
        let mut state = self.state.lock().await;
        if let Some(job) = state.job_mut(job_id) {
            job.status = status;
        }
    }

    pub async fn set_job_deadline(&self, job_id: Uuid, deadline: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(job) = state.job_mut(job_id) {
            job.deadline = Some(deadline);
        }
    }
}

#[async_trait]
impl UserExt for MemoryDb {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().await;
        let found = if let Some(user_id) = user_id {
            state.users.iter().find(|u| u.id == user_id)
        } else if let Some(username) = username {
            state.users.iter().find(|u| u.username == username)
        } else if let Some(email) = email {
            state.users.iter().find(|u| u.email == email)
        } else {
            None
        };
        Ok(found.cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(newest_first(state.users.iter().cloned()))
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.state.lock().await.users.len() as i64)
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        self.state.lock().await.insert_user(new_user)
    }

    async fn save_student(
        &self,
        mut new_user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), sqlx::Error> {
        let mut state = self.state.lock().await;
        new_user.role = Some(UserRole::Student);
        new_user.is_verified = false;
        let user = state.insert_user(new_user)?;
        let profile = state.insert_profile(user.id, profile);
        Ok((user, profile))
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        profile: Option<NewStudentProfile>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state.lock().await;

        let has_role = match state.users.iter().find(|u| u.id == user_id) {
            Some(user) => user.role.is_some(),
            None => return Ok(None),
        };
        if has_role {
            return Ok(None);
        }

        if role == UserRole::Student {
            let profile = profile.ok_or_else(|| {
                sqlx::Error::Protocol("student role requires profile details".into())
            })?;
            state.insert_profile(user_id, profile);
        }

        let user = state.user_mut(user_id).map(|user| {
            user.role = Some(role);
            user.updated_at = Utc::now();
            user.clone()
        });
        Ok(user)
    }

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_student_profile(
        &self,
        user_id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let mut state = self.state.lock().await;

        let Some(profile) = state.profile_mut(user_id) else {
            return Ok(None);
        };
        if let Some(university) = update.university {
            profile.university = university;
        }
        if let Some(course) = update.course {
            profile.course = course;
        }
        if let Some(year) = update.year_of_study {
            profile.year_of_study = year;
        }
        let profile = profile.clone();

        if let Some(user) = state.user_mut(user_id) {
            if update.phone_number.is_some() {
                user.phone_number = update.phone_number;
            }
            if let Some(email) = update.email {
                user.email = email;
            }
            user.updated_at = Utc::now();
        }

        Ok(Some(profile))
    }

    async fn set_school_id_document(
        &self,
        user_id: Uuid,
        document: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.profile_mut(user_id).map(|profile| {
            profile.school_id_document = Some(document);
            profile.id_rejection_reason = None;
            profile.clone()
        }))
    }

    async fn toggle_id_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.profile_mut(user_id).map(|profile| {
            profile.is_id_verified = !profile.is_id_verified;
            if profile.is_id_verified {
                profile.id_rejection_reason = None;
            }
            profile.clone()
        }))
    }

    async fn reject_school_id(
        &self,
        user_id: Uuid,
        reason: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.profile_mut(user_id).map(|profile| {
            profile.is_id_verified = false;
            profile.id_rejection_reason = Some(reason);
            profile.clone()
        }))
    }

    async fn toggle_account_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.user_mut(user_id).map(|user| {
            user.is_verified = !user.is_verified;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn toggle_active(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.user_mut(user_id).map(|user| {
            user.is_active = !user.is_active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl SiteUpdateExt for MemoryDb {
    async fn create_site_update(
        &self,
        title: String,
        message: String,
        audience: Audience,
    ) -> Result<SiteUpdate, sqlx::Error> {
        let update = SiteUpdate {
            id: Uuid::new_v4(),
            title,
            message,
            audience,
            is_active: true,
            created_at: Utc::now(),
        };
        self.state.lock().await.updates.push(update.clone());
        Ok(update)
    }

    async fn get_site_updates(
        &self,
        audiences: &[Audience],
        limit: i64,
    ) -> Result<Vec<SiteUpdate>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .updates
            .iter()
            .rev()
            .filter(|u| u.is_active && audiences.contains(&u.audience))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SkillExt for MemoryDb {
    async fn create_skill_submission(
        &self,
        submission: NewSkillSubmission,
    ) -> Result<SkillSubmission, sqlx::Error> {
        let submission = SkillSubmission {
            id: Uuid::new_v4(),
            student_id: submission.student_id,
            skill_name: submission.skill_name,
            proof_link: submission.proof_link,
            proof_file: submission.proof_file,
            description: submission.description,
            status: SubmissionStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
        };
        self.state.lock().await.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn get_skill_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<SkillSubmission>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.submissions.iter().find(|s| s.id == submission_id).cloned())
    }

    async fn get_student_submissions(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<SkillSubmission>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .submissions
                .iter()
                .filter(|s| s.student_id == student_id)
                .cloned()
                .collect::<Vec<_>>()
                .into_iter(),
        ))
    }

    async fn get_pending_submissions(&self) -> Result<Vec<SkillSubmission>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .submissions
                .iter()
                .filter(|s| s.status == SubmissionStatus::Pending)
                .cloned()
                .collect::<Vec<_>>()
                .into_iter(),
        ))
    }

    async fn decide_skill_submission(
        &self,
        submission_id: Uuid,
        decision: SubmissionDecision,
    ) -> Result<Option<SubmissionOutcome>, sqlx::Error> {
        let mut state = self.state.lock().await;

        let Some(index) = state.submissions.iter().position(|s| s.id == submission_id) else {
            return Ok(None);
        };

        if state.submissions[index].status != SubmissionStatus::Pending {
            return Ok(Some(SubmissionOutcome::AlreadyDecided(
                state.submissions[index].clone(),
            )));
        }

        if decision == SubmissionDecision::Reject {
            let submission = &mut state.submissions[index];
            submission.status = SubmissionStatus::Rejected;
            submission.decided_at = Some(Utc::now());
            return Ok(Some(SubmissionOutcome::Rejected(submission.clone())));
        }

        let student_id = state.submissions[index].student_id;
        let skill_name = state.submissions[index].skill_name.clone();
        if state.profiles.iter().all(|p| p.user_id != student_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let skill_id = state.skill_id_for(&skill_name);
        let profile = match state.profile_mut(student_id) {
            Some(profile) => {
                profile.is_skill_verified = true;
                profile.badges_earned += 1;
                profile.clone()
            }
            None => return Err(sqlx::Error::RowNotFound),
        };
        if !state.student_skills.contains(&(profile.id, skill_id)) {
            state.student_skills.push((profile.id, skill_id));
        }

        let submission = &mut state.submissions[index];
        submission.status = SubmissionStatus::Approved;
        submission.decided_at = Some(Utc::now());
        Ok(Some(SubmissionOutcome::Approved(submission.clone(), profile)))
    }

    async fn get_profile_skills(&self, profile_id: Uuid) -> Result<Vec<Skill>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut skills: Vec<Skill> = state
            .student_skills
            .iter()
            .filter(|(p, _)| *p == profile_id)
            .filter_map(|(_, s)| state.skills.iter().find(|skill| skill.id == *s).cloned())
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }
}

#[async_trait]
impl JobExt for MemoryDb {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, sqlx::Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            client_id: new_job.client_id,
            assigned_to: None,
            title: new_job.title,
            description: new_job.description,
            budget: new_job.budget,
            deadline: new_job.deadline,
            status: new_job.status,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        for name in &new_job.required_skills {
            let skill_id = state.skill_id_for(name);
            if !state.job_skills.contains(&(job.id, skill_id)) {
                state.job_skills.push((job.id, skill_id));
            }
        }
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn get_job_skills(&self, job_id: Uuid) -> Result<Vec<Skill>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut skills: Vec<Skill> = state
            .job_skills
            .iter()
            .filter(|(j, _)| *j == job_id)
            .filter_map(|(_, s)| state.skills.iter().find(|skill| skill.id == *s).cloned())
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<Option<Job>, sqlx::Error> {
        let mut state = self.state.lock().await;
        let Some(job) = state.job_mut(job_id) else {
            return Ok(None);
        };
        if !job.status.is_editable() {
            return Ok(None);
        }
        if let Some(title) = update.title {
            job.title = title;
        }
        if let Some(description) = update.description {
            job.description = description;
        }
        if let Some(budget) = update.budget {
            job.budget = budget;
        }
        if update.deadline.is_some() {
            job.deadline = update.deadline;
        }
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn get_open_jobs(&self, query: Option<&str>) -> Result<Vec<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        Ok(state
            .jobs
            .iter()
            .rev()
            .filter(|j| j.status == JobStatus::Open)
            .filter(|j| match &needle {
                Some(needle) => j.title.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_jobs_by_client(&self, client_id: Uuid) -> Result<Vec<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .rev()
            .filter(|j| j.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .rev()
            .filter(|j| j.status == status)
            .cloned()
            .collect())
    }

    async fn get_assigned_jobs(&self, student_id: Uuid) -> Result<Vec<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .rev()
            .filter(|j| j.assigned_to == Some(student_id))
            .cloned()
            .collect())
    }

    async fn get_expired_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.is_expired(now))
            .cloned()
            .collect())
    }

    async fn moderate_job(
        &self,
        job_id: Uuid,
        target: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state
            .job_mut(job_id)
            .filter(|job| job.status == JobStatus::Review)
            .map(|job| {
                job.status = target;
                job.updated_at = Utc::now();
                job.clone()
            }))
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<JobDeletion, sqlx::Error> {
        let mut state = self.state.lock().await;
        let Some(index) = state.jobs.iter().position(|j| j.id == job_id) else {
            return Ok(JobDeletion::NotFound);
        };
        if !state.jobs[index].status.is_deletable() {
            return Ok(JobDeletion::Blocked(state.jobs[index].clone()));
        }
        let job = state.jobs.remove(index);
        state.applications.retain(|a| a.job_id != job_id);
        state.job_skills.retain(|(j, _)| *j != job_id);
        for payment in state.payments.iter_mut().filter(|p| p.job_id == Some(job_id)) {
            payment.job_id = None;
        }
        Ok(JobDeletion::Deleted(job))
    }

    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<i64, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.jobs.iter().filter(|j| j.status == status).count() as i64)
    }

    async fn count_expired_jobs(&self, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.jobs.iter().filter(|j| j.is_expired(now)).count() as i64)
    }
}

#[async_trait]
impl ApplicationExt for MemoryDb {
    async fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationInsert, sqlx::Error> {
        let mut state = self.state.lock().await;

        let Some(job) = state.jobs.iter().find(|j| j.id == application.job_id) else {
            return Ok(ApplicationInsert::JobNotFound);
        };
        if job.status != JobStatus::Open || job.assigned_to.is_some() {
            return Ok(ApplicationInsert::JobNotOpen(job.clone()));
        }

        if let Some(existing) = state
            .applications
            .iter()
            .find(|a| a.job_id == application.job_id && a.student_id == application.student_id)
        {
            return Ok(ApplicationInsert::Applied(ApplyOutcome::AlreadyApplied(
                existing.clone(),
            )));
        }

        let created = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            student_id: application.student_id,
            proposal: application.proposal,
            bid_amount: application.bid_amount,
            cv_file: application.cv_file,
            cover_letter_file: application.cover_letter_file,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
        };
        state.applications.push(created.clone());
        Ok(ApplicationInsert::Applied(ApplyOutcome::Created(created)))
    }

    async fn get_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .cloned())
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn get_student_applications(
        &self,
        student_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .rev()
            .filter(|a| a.student_id == student_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_pending_applications(&self) -> Result<Vec<Application>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .rev()
            .filter(|a| a.is_pending())
            .cloned()
            .collect())
    }

    async fn count_pending_for_client(&self, client_id: Uuid) -> Result<i64, sqlx::Error> {
        let state = self.state.lock().await;
        let count = state
            .applications
            .iter()
            .filter(|a| a.is_pending())
            .filter(|a| {
                state
                    .jobs
                    .iter()
                    .any(|j| j.id == a.job_id && j.client_id == client_id)
            })
            .count();
        Ok(count as i64)
    }

    async fn count_pending_applications(&self) -> Result<i64, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.applications.iter().filter(|a| a.is_pending()).count() as i64)
    }

    async fn hire_application(&self, application_id: Uuid) -> Result<HireOutcome, sqlx::Error> {
        let mut state = self.state.lock().await;

        let Some(application) = state
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .cloned()
        else {
            return Ok(HireOutcome::NotFound);
        };
        let Some(job) = state.jobs.iter().find(|j| j.id == application.job_id).cloned() else {
            return Ok(HireOutcome::NotFound);
        };

        if !application.is_pending() {
            return Ok(HireOutcome::ApplicationNotPending(application));
        }
        if job.status != JobStatus::Open || job.assigned_to.is_some() {
            return Ok(HireOutcome::JobNotOpen(job));
        }

        let now = Utc::now();
        let mut rivals_rejected = 0;
        let mut accepted = application.clone();
        for app in state.applications.iter_mut().filter(|a| a.job_id == job.id) {
            if app.id == application_id {
                app.status = ApplicationStatus::Accepted;
                app.decided_at = Some(now);
                accepted = app.clone();
            } else if app.is_pending() {
                app.status = ApplicationStatus::Rejected;
                app.decided_at = Some(now);
                rivals_rejected += 1;
            }
        }

        let job = match state.job_mut(job.id) {
            Some(job) => {
                job.assigned_to = Some(accepted.student_id);
                job.status = JobStatus::Assigned;
                job.updated_at = now;
                job.clone()
            }
            None => return Ok(HireOutcome::NotFound),
        };

        Ok(HireOutcome::Hired {
            job,
            application: accepted,
            rivals_rejected,
        })
    }

    async fn reject_application(
        &self,
        application_id: Uuid,
    ) -> Result<RejectOutcome, sqlx::Error> {
        let mut state = self.state.lock().await;
        let Some(app) = state.applications.iter_mut().find(|a| a.id == application_id) else {
            return Ok(RejectOutcome::NotFound);
        };
        if !app.is_pending() {
            return Ok(RejectOutcome::ApplicationNotPending(app.clone()));
        }
        app.status = ApplicationStatus::Rejected;
        app.decided_at = Some(Utc::now());
        Ok(RejectOutcome::Rejected(app.clone()))
    }
}

#[async_trait]
impl PaymentExt for MemoryDb {
    async fn create_job_payment(
        &self,
        payment: NewJobPayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut state = self.state.lock().await;
        let active = state.payments.iter().any(|p| {
            p.purpose == PaymentPurpose::Job
                && p.job_id == Some(payment.job_id)
                && p.status != PaymentStatus::Failed
        });
        if active {
            return Ok(None);
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            payer_id: payment.payer_id,
            beneficiary_id: payment.beneficiary_id,
            job_id: Some(payment.job_id),
            donation_id: None,
            purpose: PaymentPurpose::Job,
            amount: payment.amount,
            checkout_request_id: None,
            mpesa_receipt: None,
            result_code: None,
            raw_callback: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.payments.push(payment.clone());
        Ok(Some(payment))
    }

    async fn create_donation_with_payment(
        &self,
        donation: NewDonation,
    ) -> Result<(Donation, Payment), sqlx::Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let created = Donation {
            id: Uuid::new_v4(),
            donor_id: Some(donation.donor_id),
            amount: donation.amount.clone(),
            message: donation.message,
            mpesa_code: None,
            is_paid: false,
            created_at: now,
        };
        let payment = Payment {
            id: Uuid::new_v4(),
            payer_id: donation.donor_id,
            beneficiary_id: None,
            job_id: None,
            donation_id: Some(created.id),
            purpose: PaymentPurpose::Donation,
            amount: donation.amount,
            checkout_request_id: None,
            mpesa_receipt: None,
            result_code: None,
            raw_callback: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.donations.push(created.clone());
        state.payments.push(payment.clone());
        Ok((created, payment))
    }

    async fn attach_checkout_request_id(
        &self,
        payment_id: Uuid,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut state = self.state.lock().await;
        if state
            .payments
            .iter()
            .any(|p| p.checkout_request_id.as_deref() == Some(checkout_request_id))
        {
            return Err(UniqueViolation::error("payments_checkout_request_id_key"));
        }
        Ok(state
            .payment_mut(payment_id)
            .filter(|p| p.status == PaymentStatus::Pending && p.checkout_request_id.is_none())
            .map(|p| {
                p.checkout_request_id = Some(checkout_request_id.to_string());
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    async fn mark_payment_failed(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state
            .payment_mut(payment_id)
            .filter(|p| p.status == PaymentStatus::Pending)
            .map(|p| {
                p.status = PaymentStatus::Failed;
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.payments.iter().find(|p| p.id == payment_id).cloned())
    }

    async fn get_payment_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.checkout_request_id.as_deref() == Some(checkout_request_id))
            .cloned())
    }

    async fn apply_payment_callback(
        &self,
        callback: &StkCallback,
        raw: Value,
    ) -> Result<CallbackOutcome, sqlx::Error> {
        let mut state = self.state.lock().await;

        let Some(payment) = state
            .payments
            .iter_mut()
            .find(|p| p.checkout_request_id.as_deref() == Some(callback.checkout_request_id.as_str()))
        else {
            return Ok(CallbackOutcome::NotFound);
        };

        if payment.status.is_terminal() {
            return Ok(CallbackOutcome::AlreadySettled(payment.clone()));
        }

        let now = Utc::now();
        payment.result_code = Some(callback.result_code);
        payment.raw_callback = Some(raw);
        payment.updated_at = now;
        if callback.is_success() {
            payment.status = PaymentStatus::Success;
            payment.mpesa_receipt = callback.receipt.clone();
        } else {
            payment.status = PaymentStatus::Failed;
        }
        let payment = payment.clone();

        if callback.is_success() {
            match payment.purpose {
                PaymentPurpose::Donation => {
                    if let Some(donation) = state
                        .donations
                        .iter_mut()
                        .find(|d| Some(d.id) == payment.donation_id)
                    {
                        donation.is_paid = true;
                        donation.mpesa_code = callback.receipt.clone();
                    }
                }
                PaymentPurpose::Job => {
                    if let Some(job) = payment.job_id.and_then(|id| state.job_mut(id)) {
                        job.status = JobStatus::Completed;
                        job.completed_at = Some(now);
                        job.updated_at = now;
                    }
                }
            }
        }

        Ok(CallbackOutcome::Settled(payment))
    }

    async fn get_donation(&self, donation_id: Uuid) -> Result<Option<Donation>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state.donations.iter().find(|d| d.id == donation_id).cloned())
    }

    async fn get_donor_donations(&self, donor_id: Uuid) -> Result<Vec<Donation>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .donations
            .iter()
            .rev()
            .filter(|d| d.donor_id == Some(donor_id))
            .cloned()
            .collect())
    }
}
