// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{
    Audience, NewStudentProfile, NewUser, SiteUpdate, StudentProfile, StudentProfileUpdate, User,
    UserRole,
};

pub const USERS_EMAIL_KEY: &str = "users_email_key";
pub const USERS_USERNAME_KEY: &str = "users_username_key";

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;

    /// Creates the account and its student profile in one transaction.
    async fn save_student(
        &self,
        new_user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), sqlx::Error>;

    /// One-time role selection. Returns `None` when the account already has a
    /// role (or does not exist); a student role creates the profile alongside.
    async fn assign_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        profile: Option<NewStudentProfile>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error>;

    async fn update_student_profile(
        &self,
        user_id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, sqlx::Error>;

    /// Stores a new school ID document reference and clears any earlier rejection.
    async fn set_school_id_document(
        &self,
        user_id: Uuid,
        document: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error>;

    /// Flips the identity flag; turning it on clears the rejection reason.
    async fn toggle_id_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error>;

    async fn reject_school_id(
        &self,
        user_id: Uuid,
        reason: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error>;

    async fn toggle_account_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn toggle_active(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
pub trait SiteUpdateExt {
    async fn create_site_update(
        &self,
        title: String,
        message: String,
        audience: Audience,
    ) -> Result<SiteUpdate, sqlx::Error>;

    async fn get_site_updates(
        &self,
        audiences: &[Audience],
        limit: i64,
    ) -> Result<Vec<SiteUpdate>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at DESC"#)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, password, phone_number, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.name)
        .bind(new_user.password)
        .bind(new_user.phone_number)
        .bind(new_user.role)
        .bind(new_user.is_verified)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_student(
        &self,
        new_user: NewUser,
        profile: NewStudentProfile,
    ) -> Result<(User, StudentProfile), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, password, phone_number, role, is_verified)
            VALUES ($1, $2, $3, $4, $5, 'student'::user_role, FALSE)
            RETURNING *
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.name)
        .bind(new_user.password)
        .bind(new_user.phone_number)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, StudentProfile>(
            r#"
            INSERT INTO student_profiles (user_id, university, course, year_of_study)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(profile.university)
        .bind(profile.course)
        .bind(profile.year_of_study)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, profile))
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        profile: Option<NewStudentProfile>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // role IS NULL makes the selection a one-shot compare-and-set
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1 AND role IS NULL
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            tx.rollback().await?;
            return Ok(None);
        };

        if role == UserRole::Student {
            let profile = profile.ok_or_else(|| {
                sqlx::Error::Protocol("student role requires profile details".into())
            })?;

            sqlx::query(
                r#"
                INSERT INTO student_profiles (user_id, university, course, year_of_study)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user.id)
            .bind(profile.university)
            .bind(profile.course)
            .bind(profile.year_of_study)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(user))
    }

    async fn get_student_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        sqlx::query_as::<_, StudentProfile>(r#"SELECT * FROM student_profiles WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_student_profile(
        &self,
        user_id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET university = COALESCE($2, university),
                course = COALESCE($3, course),
                year_of_study = COALESCE($4, year_of_study)
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(update.university)
        .bind(update.course)
        .bind(update.year_of_study)
        .fetch_optional(&mut *tx)
        .await?;

        if profile.is_some() {
            sqlx::query(
                r#"
                UPDATE users
                SET phone_number = COALESCE($2, phone_number),
                    email = COALESCE($3, email),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(update.phone_number)
            .bind(update.email)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }

    async fn set_school_id_document(
        &self,
        user_id: Uuid,
        document: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET school_id_document = $2, id_rejection_reason = NULL
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(document)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_id_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        // right-hand sides see the old row, so NOT is_id_verified is the new value
        sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET is_id_verified = NOT is_id_verified,
                id_rejection_reason = CASE WHEN NOT is_id_verified THEN NULL ELSE id_rejection_reason END
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn reject_school_id(
        &self,
        user_id: Uuid,
        reason: String,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET is_id_verified = FALSE, id_rejection_reason = $2
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_account_verification(
        &self,
        user_id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_verified = NOT is_verified, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_active(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl SiteUpdateExt for DBClient {
    async fn create_site_update(
        &self,
        title: String,
        message: String,
        audience: Audience,
    ) -> Result<SiteUpdate, sqlx::Error> {
        sqlx::query_as::<_, SiteUpdate>(
            r#"
            INSERT INTO site_updates (title, message, audience)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(message)
        .bind(audience)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_site_updates(
        &self,
        audiences: &[Audience],
        limit: i64,
    ) -> Result<Vec<SiteUpdate>, sqlx::Error> {
        sqlx::query_as::<_, SiteUpdate>(
            r#"
            SELECT * FROM site_updates
            WHERE is_active = TRUE AND audience::text = ANY($1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(
            audiences
                .iter()
                .map(|a| a.to_str().to_string())
                .collect::<Vec<String>>(),
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
