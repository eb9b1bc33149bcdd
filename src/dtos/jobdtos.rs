use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    jobmodel::{Application, ApplicationAction, Job, ModerationAction},
    skillmodel::Skill,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(range(min = 1.0, message = "Budget must be greater than zero"))]
    pub budget: f64,

    pub deadline: Option<DateTime<Utc>>,

    #[serde(default)]
    pub required_skills: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1.0, message = "Budget must be greater than zero"))]
    pub budget: Option<f64>,

    pub deadline: Option<DateTime<Utc>>,
}

/// Converts a request amount to a two-decimal money value.
pub fn to_money(amount: f64) -> Option<BigDecimal> {
    BigDecimal::from_f64(amount).map(|a| a.with_scale(2))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JobBoardQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobDetailDto {
    pub job: Job,
    pub required_skills: Vec<Skill>,
    pub is_expired: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApplyJobDto {
    #[validate(length(min = 10, message = "Proposal must be at least 10 characters"))]
    pub proposal: String,

    #[validate(range(min = 1.0, message = "Bid must be greater than zero"))]
    pub bid_amount: Option<f64>,

    pub cv_file: Option<String>,
    pub cover_letter_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModerateJobDto {
    pub action: ModerationAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessApplicationDto {
    pub action: ApplicationAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobApplicantsDto {
    pub job: Job,
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HireResultDto {
    pub job: Job,
    pub application: Application,
    pub rivals_rejected: u64,
}
