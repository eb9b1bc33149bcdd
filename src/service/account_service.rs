// service/account_service.rs
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{
        userdb::{UserExt, USERS_EMAIL_KEY, USERS_USERNAME_KEY},
        MarketplaceDb,
    },
    dtos::userdtos::{
        RegisterAccountDto, RegisterStudentDto, RegisterUserDto, SelectRoleDto,
        StudentProfileDto, UpdateStudentProfileDto,
    },
    db::skilldb::SkillExt,
    error::ErrorMessage,
    models::usermodel::{
        NewStudentProfile, NewUser, StudentProfile, StudentProfileUpdate, User, UserRole,
    },
    service::error::ServiceError,
    utils::password,
};

const DEFAULT_ID_REJECTION: &str =
    "Your School ID could not be verified. Please upload a clearer copy.";

/// Result of an admin verification toggle; students flip their identity
/// flag, everyone else the account flag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum VerificationToggle {
    StudentId(StudentProfile),
    Account(User),
}

#[derive(Debug, Clone)]
pub struct AccountService {
    db_client: Arc<dyn MarketplaceDb>,
}

impl AccountService {
    pub fn new(db_client: Arc<dyn MarketplaceDb>) -> Self {
        Self { db_client }
    }

    async fn ensure_unique(&self, username: &str, email: &str) -> Result<(), ServiceError> {
        if self.db_client.get_user(None, None, Some(email)).await?.is_some() {
            return Err(ServiceError::Validation(ErrorMessage::EmailExist.to_string()));
        }
        if self.db_client.get_user(None, Some(username), None).await?.is_some() {
            return Err(ServiceError::Validation(ErrorMessage::UsernameExist.to_string()));
        }
        Ok(())
    }

    /// A registration racing past `ensure_unique` still lands on the unique
    /// constraints; report those the same way.
    fn registration_error(error: sqlx::Error) -> ServiceError {
        let constraint = error
            .as_database_error()
            .filter(|e| e.is_unique_violation())
            .and_then(|e| e.constraint().map(str::to_owned));

        match constraint.as_deref() {
            Some(USERS_EMAIL_KEY) => ServiceError::Validation(ErrorMessage::EmailExist.to_string()),
            Some(USERS_USERNAME_KEY) => {
                ServiceError::Validation(ErrorMessage::UsernameExist.to_string())
            }
            _ => ServiceError::Database(error),
        }
    }

    fn hash(raw: &str) -> Result<String, ServiceError> {
        password::hash(raw).map_err(|e| ServiceError::Validation(e.to_string()))
    }

    /// Role-less sign-up; the account must pick a role before doing anything else.
    pub async fn register(&self, body: RegisterUserDto) -> Result<User, ServiceError> {
        self.ensure_unique(&body.username, &body.email).await?;

        let user = self
            .db_client
            .save_user(NewUser {
                username: body.username.clone(),
                email: body.email,
                name: body.username,
                password: Self::hash(&body.password)?,
                phone_number: None,
                role: None,
                is_verified: false,
            })
            .await
            .map_err(Self::registration_error)?;

        info!("👤 Registered account {} without a role", user.id);
        Ok(user)
    }

    pub async fn register_student(
        &self,
        body: RegisterStudentDto,
    ) -> Result<(User, StudentProfile), ServiceError> {
        self.ensure_unique(&body.username, &body.email).await?;

        let (user, profile) = self
            .db_client
            .save_student(
                NewUser {
                    username: body.username,
                    email: body.email,
                    name: body.name,
                    password: Self::hash(&body.password)?,
                    phone_number: Some(body.phone_number),
                    role: Some(UserRole::Student),
                    is_verified: false,
                },
                NewStudentProfile {
                    university: body.university,
                    course: body.course,
                    year_of_study: body.year_of_study,
                },
            )
            .await
            .map_err(Self::registration_error)?;

        info!("🎓 Registered student {} with profile {}", user.id, profile.id);
        Ok((user, profile))
    }

    /// Client and donor sign-up. Clients start unverified.
    pub async fn register_account(
        &self,
        body: RegisterAccountDto,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        if !matches!(role, UserRole::Client | UserRole::Donor) {
            return Err(ServiceError::Validation(format!(
                "Cannot register a {} account here",
                role.to_str()
            )));
        }
        self.ensure_unique(&body.username, &body.email).await?;

        let user = self
            .db_client
            .save_user(NewUser {
                name: body.name.unwrap_or_else(|| body.username.clone()),
                username: body.username,
                email: body.email,
                password: Self::hash(&body.password)?,
                phone_number: body.phone_number,
                role: Some(role),
                is_verified: false,
            })
            .await
            .map_err(Self::registration_error)?;

        info!("👤 Registered {} account {}", role.to_str(), user.id);
        Ok(user)
    }

    /// One-time role selection for accounts that signed up without one.
    pub async fn select_role(&self, user: &User, body: SelectRoleDto) -> Result<User, ServiceError> {
        if user.role.is_some() {
            warn!("Account {} tried to select a role twice", user.id);
            return Err(ServiceError::Validation("Role has already been selected".to_string()));
        }
        if !body.role.is_self_selectable() {
            return Err(ServiceError::Authorization(
                ErrorMessage::PermissionDenied.to_string(),
            ));
        }

        let profile = if body.role == UserRole::Student {
            match (body.university, body.course) {
                (Some(university), Some(course)) => Some(NewStudentProfile {
                    university,
                    course,
                    year_of_study: body.year_of_study.unwrap_or(1),
                }),
                _ => {
                    return Err(ServiceError::Validation(
                        "University and course are required for students".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let updated = self
            .db_client
            .assign_role(user.id, body.role, profile)
            .await?
            .ok_or_else(|| ServiceError::Validation("Role has already been selected".to_string()))?;

        info!("🔑 Account {} selected role {}", user.id, body.role.to_str());
        Ok(updated)
    }

    pub async fn authenticate(&self, email: &str, raw_password: &str) -> Result<User, ServiceError> {
        let wrong = || ServiceError::Validation(ErrorMessage::WrongCredentials.to_string());

        let user = self
            .db_client
            .get_user(None, None, Some(email))
            .await?
            .ok_or_else(wrong)?;

        let matched = password::compare(raw_password, user.password.as_deref()).map_err(|_| wrong())?;
        if !matched {
            return Err(wrong());
        }
        if !user.is_active {
            warn!("Banned account {} attempted to log in", user.id);
            return Err(ServiceError::Authorization(ErrorMessage::UserBanned.to_string()));
        }

        Ok(user)
    }

    /// Creates the configured admin account once; later calls are no-ops.
    pub async fn ensure_admin(
        &self,
        email: &str,
        raw_password: &str,
    ) -> Result<Option<User>, ServiceError> {
        if self.db_client.get_user(None, None, Some(email)).await?.is_some() {
            return Ok(None);
        }

        let username = email.split('@').next().unwrap_or("admin").to_string();
        let admin = self
            .db_client
            .save_user(NewUser {
                name: "Administrator".to_string(),
                username,
                email: email.to_string(),
                password: Self::hash(raw_password)?,
                phone_number: None,
                role: Some(UserRole::Admin),
                is_verified: true,
            })
            .await?;

        info!("🛡️ Bootstrapped admin account {}", admin.id);
        Ok(Some(admin))
    }

    pub async fn student_profile(&self, user_id: Uuid) -> Result<StudentProfileDto, ServiceError> {
        let profile = self
            .db_client
            .get_student_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", user_id))?;
        let skills = self.db_client.get_profile_skills(profile.id).await?;
        Ok(StudentProfileDto { profile, skills })
    }

    pub async fn update_student_profile(
        &self,
        user_id: Uuid,
        body: UpdateStudentProfileDto,
    ) -> Result<StudentProfile, ServiceError> {
        if let Some(email) = &body.email {
            if let Some(other) = self.db_client.get_user(None, None, Some(email)).await? {
                if other.id != user_id {
                    return Err(ServiceError::Validation(ErrorMessage::EmailExist.to_string()));
                }
            }
        }

        self.db_client
            .update_student_profile(
                user_id,
                StudentProfileUpdate {
                    university: body.university,
                    course: body.course,
                    year_of_study: body.year_of_study,
                    phone_number: body.phone_number,
                    email: body.email,
                },
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", user_id))
    }

    pub async fn upload_school_id(
        &self,
        user_id: Uuid,
        document: String,
    ) -> Result<StudentProfile, ServiceError> {
        let profile = self
            .db_client
            .set_school_id_document(user_id, document)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", user_id))?;

        info!("🪪 Student {} uploaded a school ID", user_id);
        Ok(profile)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_users().await?)
    }

    pub async fn toggle_ban(&self, admin: &User, target_id: Uuid) -> Result<User, ServiceError> {
        if admin.id == target_id {
            return Err(ServiceError::Validation("You cannot ban yourself".to_string()));
        }

        let user = self
            .db_client
            .toggle_active(target_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", target_id))?;

        info!(
            "🚫 Admin {} set account {} active={}",
            admin.id, user.id, user.is_active
        );
        Ok(user)
    }

    pub async fn toggle_verification(
        &self,
        target_id: Uuid,
    ) -> Result<VerificationToggle, ServiceError> {
        let user = self
            .db_client
            .get_user(Some(target_id), None, None)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", target_id))?;

        if user.has_role(UserRole::Student) {
            let profile = self
                .db_client
                .toggle_id_verification(target_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Student profile for user", target_id))?;
            info!("✅ Student {} id_verified={}", target_id, profile.is_id_verified);
            return Ok(VerificationToggle::StudentId(profile));
        }

        let user = self
            .db_client
            .toggle_account_verification(target_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", target_id))?;
        info!("✅ Account {} verified={}", target_id, user.is_verified);
        Ok(VerificationToggle::Account(user))
    }

    pub async fn reject_school_id(
        &self,
        target_id: Uuid,
        reason: Option<String>,
    ) -> Result<StudentProfile, ServiceError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ID_REJECTION.to_string());

        let profile = self
            .db_client
            .reject_school_id(target_id, reason)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student profile for user", target_id))?;

        info!("❌ School ID rejected for student {}", target_id);
        Ok(profile)
    }
}
