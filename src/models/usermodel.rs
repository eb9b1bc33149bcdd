use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Client,
    Donor,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Student => "student",
            UserRole::Client => "client",
            UserRole::Donor => "donor",
            UserRole::Admin => "admin",
        }
    }

    /// Roles an account may pick for itself through the role-selection step.
    pub fn is_self_selectable(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub phone_number: Option<String>,
    // None for externally registered accounts that have not selected a role yet
    pub role: Option<UserRole>,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub university: String,
    pub course: String,
    pub year_of_study: i32,
    pub badges_earned: i32,
    pub is_skill_verified: bool,
    pub school_id_document: Option<String>,
    pub is_id_verified: bool,
    pub id_rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StudentProfile {
    /// Soft gate in front of the job board and the apply action. Returns the
    /// message to show when the student is not yet allowed through.
    pub fn marketplace_gate(&self) -> Option<&'static str> {
        if !self.is_id_verified {
            return Some("Please upload your School ID and wait for verification first.");
        }
        if !self.is_skill_verified {
            return Some("You must pass a skill assessment to browse gigs.");
        }
        None
    }
}

/// Account fields captured at registration time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
    pub is_verified: bool,
}

#[derive(Debug, Clone)]
pub struct NewStudentProfile {
    pub university: String,
    pub course: String,
    pub year_of_study: i32,
}

#[derive(Debug, Clone, Default)]
pub struct StudentProfileUpdate {
    pub university: Option<String>,
    pub course: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "audience", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    All,
    Student,
    Client,
    Donor,
}

impl Audience {
    pub fn to_str(&self) -> &str {
        match self {
            Audience::All => "all",
            Audience::Student => "student",
            Audience::Client => "client",
            Audience::Donor => "donor",
        }
    }

    /// Audiences whose updates a reader with `role` gets to see.
    pub fn visible_to(role: Option<UserRole>) -> Vec<Audience> {
        let mut audiences = vec![Audience::All];
        match role {
            Some(UserRole::Student) => audiences.push(Audience::Student),
            Some(UserRole::Client) => audiences.push(Audience::Client),
            Some(UserRole::Donor) => audiences.push(Audience::Donor),
            Some(UserRole::Admin) => {
                audiences.extend([Audience::Student, Audience::Client, Audience::Donor])
            }
            None => {}
        }
        audiences
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct SiteUpdate {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub audience: Audience,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id_verified: bool, skill_verified: bool) -> StudentProfile {
        StudentProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            university: "UoN".to_string(),
            course: "CS".to_string(),
            year_of_study: 2,
            badges_earned: 0,
            is_skill_verified: skill_verified,
            school_id_document: None,
            is_id_verified: id_verified,
            id_rejection_reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_marketplace_gate_requires_both_flags() {
        assert!(profile(false, true).marketplace_gate().unwrap().contains("School ID"));
        assert!(profile(true, false).marketplace_gate().unwrap().contains("skill assessment"));
        assert!(profile(false, false).marketplace_gate().unwrap().contains("School ID"));
        assert_eq!(profile(true, true).marketplace_gate(), None);
    }

    #[test]
    fn test_audience_visibility() {
        assert_eq!(Audience::visible_to(None), vec![Audience::All]);
        assert_eq!(
            Audience::visible_to(Some(UserRole::Client)),
            vec![Audience::All, Audience::Client]
        );
        assert_eq!(Audience::visible_to(Some(UserRole::Admin)).len(), 4);
    }

    #[test]
    fn test_admin_is_not_self_selectable() {
        assert!(!UserRole::Admin.is_self_selectable());
        assert!(UserRole::Student.is_self_selectable());
        assert!(UserRole::Donor.is_self_selectable());
    }
}
