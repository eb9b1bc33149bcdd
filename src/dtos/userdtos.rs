use std::borrow::Cow;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    jobmodel::{Application, Job},
    paymentmodel::Donation,
    skillmodel::Skill,
    usermodel::{Audience, SiteUpdate, StudentProfile, User, UserRole},
};

/// Accepts local (07..., 01...) and international (+2547..., 2547...) forms.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let phone_regex = regex::Regex::new(r"^\+?[0-9]{9,15}$")
        .map_err(|_| ValidationError::new("Invalid phone regex"))?;

    if !phone_regex.is_match(phone.trim()) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from(
            "Phone number must be in a valid format (e.g., 0712345678 or +254712345678)",
        ));
        return Err(error);
    }
    Ok(())
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterStudentDto {
    #[validate(length(min = 1, max = 150, message = "Full name is required"))]
    pub name: String,

    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,

    #[validate(length(min = 1, max = 100, message = "University is required"))]
    pub university: String,

    #[validate(length(min = 1, max = 100, message = "Course is required"))]
    pub course: String,

    #[validate(range(min = 1, max = 7, message = "Year of study must be between 1 and 7"))]
    pub year_of_study: i32,
}

/// Client and donor sign-up share the same shape.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterAccountDto {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6 and 64 characters"))]
    pub password: String,

    pub name: Option<String>,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SelectRoleDto {
    pub role: UserRole,

    #[validate(length(min = 1, max = 100, message = "University is required"))]
    pub university: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Course is required"))]
    pub course: Option<String>,

    #[validate(range(min = 1, max = 7, message = "Year of study must be between 1 and 7"))]
    pub year_of_study: Option<i32>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateStudentProfileDto {
    #[validate(length(min = 1, max = 100))]
    pub university: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub course: Option<String>,

    #[validate(range(min = 1, max = 7, message = "Year of study must be between 1 and 7"))]
    pub year_of_study: Option<i32>,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct UploadSchoolIdDto {
    /// Reference to the stored document (path or object key).
    #[validate(length(min = 1, max = 500, message = "Document reference is required"))]
    pub document: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentProfileDto {
    pub profile: StudentProfile,
    pub skills: Vec<Skill>,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectIdDto {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteUpdateDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    #[serde(default = "default_audience")]
    pub audience: Audience,
}

fn default_audience() -> Audience {
    Audience::All
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentDashboardDto {
    pub profile: StudentProfile,
    pub recent_applications: Vec<Application>,
    pub active_jobs: Vec<Job>,
    pub total_earnings: BigDecimal,
    pub updates: Vec<SiteUpdate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientDashboardDto {
    pub jobs: Vec<Job>,
    pub active_jobs: usize,
    pub pending_applicants: i64,
    pub completed_jobs: usize,
    pub is_verified: bool,
    pub updates: Vec<SiteUpdate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DonorDashboardDto {
    pub donations: Vec<Donation>,
    pub total_donated: BigDecimal,
    pub comrades_supported: i64,
    pub updates: Vec<SiteUpdate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminDashboardDto {
    pub total_users: i64,
    pub jobs_in_review: i64,
    pub pending_submissions: usize,
    pub expired_jobs: i64,
    pub pending_applications: i64,
}
