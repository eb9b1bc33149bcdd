// Shared fixtures for service tests.
use std::sync::Arc;

use crate::{
    db::{memory::MemoryDb, MarketplaceDb},
    dtos::{
        jobdtos::{ApplyJobDto, CreateJobDto},
        skilldtos::SubmitSkillDto,
        userdtos::{RegisterAccountDto, RegisterStudentDto},
    },
    models::{
        jobmodel::{Job, ModerationAction},
        skillmodel::SubmissionDecision,
        usermodel::{User, UserRole},
    },
    service::{
        account_service::{AccountService, VerificationToggle},
        dashboard_service::DashboardService,
        hiring_service::HiringService,
        job_service::JobService,
        mpesa::{testing::FakeGateway, PaymentGateway},
        payment_service::PaymentService,
        skill_service::SkillService,
    },
};

pub struct Services {
    pub accounts: AccountService,
    pub skills: SkillService,
    pub jobs: JobService,
    pub hiring: HiringService,
    pub payments: PaymentService,
    pub dashboards: DashboardService,
    pub gateway: Arc<FakeGateway>,
}

pub fn fixtures() -> (Arc<MemoryDb>, Services) {
    let db = Arc::new(MemoryDb::new());
    let gateway = Arc::new(FakeGateway::new());
    let db_client: Arc<dyn MarketplaceDb> = db.clone();
    let push: Arc<dyn PaymentGateway> = gateway.clone();

    let services = Services {
        accounts: AccountService::new(db_client.clone()),
        skills: SkillService::new(db_client.clone()),
        jobs: JobService::new(db_client.clone()),
        hiring: HiringService::new(db_client.clone()),
        payments: PaymentService::new(db_client.clone(), push, "254".to_string()),
        dashboards: DashboardService::new(db_client),
        gateway,
    };
    (db, services)
}

pub fn student_dto(name: &str) -> RegisterStudentDto {
    RegisterStudentDto {
        name: format!("{} Comrade", name),
        username: name.to_string(),
        email: format!("{}@uni.ac.ke", name),
        password: "password123".to_string(),
        phone_number: "0712345678".to_string(),
        university: "University of Nairobi".to_string(),
        course: "Computer Science".to_string(),
        year_of_study: 2,
    }
}

fn account_dto(name: &str) -> RegisterAccountDto {
    RegisterAccountDto {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password: "password123".to_string(),
        name: None,
        phone_number: Some("0722000000".to_string()),
    }
}

pub fn job_dto(title: &str) -> CreateJobDto {
    CreateJobDto {
        title: title.to_string(),
        description: format!("{} for our campus startup", title),
        budget: 1500.0,
        deadline: None,
        required_skills: vec!["Design".to_string()],
    }
}

pub fn apply_dto() -> ApplyJobDto {
    ApplyJobDto {
        proposal: "I have done similar work for two student clubs.".to_string(),
        bid_amount: None,
        cv_file: None,
        cover_letter_file: None,
    }
}

/// Client account already verified by an admin.
pub async fn verified_client(services: &Services, name: &str) -> User {
    let client = services
        .accounts
        .register_account(account_dto(name), UserRole::Client)
        .await
        .unwrap();
    match services.accounts.toggle_verification(client.id).await.unwrap() {
        VerificationToggle::Account(user) => user,
        other => panic!("expected account verification, got {:?}", other),
    }
}

pub async fn donor_account(services: &Services, name: &str) -> User {
    services
        .accounts
        .register_account(account_dto(name), UserRole::Donor)
        .await
        .unwrap()
}

/// Student past both marketplace gates: School ID verified and one
/// approved skill.
pub async fn verified_student(services: &Services, name: &str) -> User {
    let (student, _) = services
        .accounts
        .register_student(student_dto(name))
        .await
        .unwrap();
    services.accounts.toggle_verification(student.id).await.unwrap();

    let submission = services
        .skills
        .submit(
            student.id,
            SubmitSkillDto {
                skill_name: "Design".to_string(),
                proof_link: Some(format!("https://behance.net/{}", name)),
                proof_file: None,
                description: None,
            },
        )
        .await
        .unwrap();
    services
        .skills
        .decide(submission.id, SubmissionDecision::Approve)
        .await
        .unwrap();
    student
}

/// Job posted by `client` and approved by moderation.
pub async fn create_open_job(services: &Services, client: &User, title: &str) -> Job {
    let job = services.jobs.create_job(client, job_dto(title)).await.unwrap();
    services
        .jobs
        .moderate(job.id, ModerationAction::Approve)
        .await
        .unwrap()
}
