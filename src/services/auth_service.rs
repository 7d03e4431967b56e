use crate::config::get_config;
use crate::dto::auth_dto::{
    AdminLoginPayload, LoginPayload, LoginResponse, RegisterAdminPayload, RegisterStudentPayload,
    RegisterTeacherPayload, RoleDetails,
};
use crate::error::{Error, Result};
use crate::models::profile::{AdminProfile, StudentProfile, TeacherProfile};
use crate::models::user::{Role, User};
use crate::services::classroom_service::ClassroomService;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::{generate_access_token, hash_token};
use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TOKEN_LENGTH: usize = 48;

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves a login identifier against username, teacher_email, then
    /// admin_email, in that priority order.
    pub async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let by_username = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        if by_username.is_some() {
            return Ok(by_username);
        }

        let by_teacher_email = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN teachers t ON t.user_id = u.id
            WHERE t.teacher_email = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        if by_teacher_email.is_some() {
            return Ok(by_teacher_email);
        }

        let by_admin_email = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN admins a ON a.user_id = u.id
            WHERE a.admin_email = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(by_admin_email)
    }

    pub async fn register_admin(&self, payload: RegisterAdminPayload) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_username_free(&mut tx, &payload.username).await?;
        let email_taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM admins WHERE admin_email = $1)"#)
                .bind(&payload.admin_email)
                .fetch_one(&mut *tx)
                .await?;
        if email_taken {
            return Err(Error::Unprocessable("Admin email is already taken".into()));
        }

        let user = Self::insert_user(
            &mut tx,
            &payload.username,
            &payload.admin_password,
            Role::Admin,
        )
        .await?;

        // The security code is a second factor; hashed at rest like a password.
        let code_hash = hash_password(&payload.admin_security_code)?;
        sqlx::query(
            r#"
            INSERT INTO admins (user_id, admin_email, admin_security_code_hash)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id)
        .bind(&payload.admin_email)
        .bind(&code_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn register_teacher(&self, payload: RegisterTeacherPayload) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_username_free(&mut tx, &payload.teacher_username).await?;
        let email_taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM teachers WHERE teacher_email = $1)"#)
                .bind(&payload.teacher_email)
                .fetch_one(&mut *tx)
                .await?;
        if email_taken {
            return Err(Error::Unprocessable(
                "Teacher email is already taken".into(),
            ));
        }

        let user = Self::insert_user(
            &mut tx,
            &payload.teacher_username,
            &payload.teacher_password,
            Role::Teacher,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO teachers (user_id, teacher_email, teacher_name, teacher_position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(&payload.teacher_email)
        .bind(&payload.teacher_name)
        .bind(&payload.teacher_position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn register_student(&self, payload: RegisterStudentPayload) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_username_free(&mut tx, &payload.student_username).await?;
        let lrn_taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM students WHERE student_lrn = $1)"#)
                .bind(&payload.student_lrn)
                .fetch_one(&mut *tx)
                .await?;
        if lrn_taken {
            return Err(Error::Unprocessable("Student LRN is already taken".into()));
        }

        let user = Self::insert_user(
            &mut tx,
            &payload.student_username,
            &payload.student_password,
            Role::Student,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO students (user_id, student_name, student_lrn, student_grade, student_section)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&payload.student_name)
        .bind(&payload.student_lrn)
        .bind(&payload.student_grade)
        .bind(&payload.student_section)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Password login for any role. On success a student's current classroom
    /// summary is composed into the response so the client skips a round trip.
    pub async fn login(
        &self,
        classrooms: &ClassroomService,
        payload: LoginPayload,
    ) -> Result<LoginResponse> {
        let user = self
            .find_user_by_login(&payload.login)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".into()))?;

        if !verify_password(&payload.password, &user.password_hash)? {
            return Err(Error::Unauthorized("Invalid credentials".into()));
        }

        let issued = self.issue_token(user.id).await?;
        let details = self.fetch_role_details(&user).await?;

        let student_class = match &details {
            Some(RoleDetails::Student(student)) => {
                classrooms.student_class_summary(student.id).await?
            }
            _ => None,
        };

        Ok(LoginResponse {
            token: issued.token,
            expires_in: issued.expires_in,
            role: user.role,
            user,
            details,
            student_class,
        })
    }

    /// Two-phase admin login. Password is checked first; a missing security
    /// code yields the distinguished step-2 challenge rather than a terminal
    /// failure, and a wrong code fails like any bad credential.
    pub async fn admin_login(&self, payload: AdminLoginPayload) -> Result<LoginResponse> {
        let user = self
            .find_user_by_login(&payload.login)
            .await?
            .filter(|u| u.role == Role::Admin)
            .ok_or_else(|| Error::Unauthorized("Invalid admin credentials".into()))?;

        if !verify_password(&payload.password, &user.password_hash)? {
            return Err(Error::Unauthorized("Invalid admin credentials".into()));
        }

        let admin =
            sqlx::query_as::<_, AdminProfile>(r#"SELECT * FROM admins WHERE user_id = $1"#)
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

        let code = payload
            .admin_security_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let Some(code) = code else {
            return Err(Error::SecurityCodeRequired);
        };

        if !verify_password(code, &admin.admin_security_code_hash)? {
            return Err(Error::Unauthorized(
                "Incorrect admin security code".into(),
            ));
        }

        let issued = self.issue_token(user.id).await?;
        Ok(LoginResponse {
            token: issued.token,
            expires_in: issued.expires_in,
            role: user.role,
            user,
            details: Some(RoleDetails::Admin(admin)),
            student_class: None,
        })
    }

    pub async fn issue_token(&self, user_id: Uuid) -> Result<IssuedToken> {
        let ttl = get_config().token_ttl_secs;
        let token = generate_access_token(TOKEN_LENGTH);
        let expires_at = Utc::now() + Duration::seconds(ttl);

        // Opportunistic purge keeps the table bounded without a scheduler.
        sqlx::query(r#"DELETE FROM access_tokens WHERE expires_at < NOW()"#)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"INSERT INTO access_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)"#,
        )
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(IssuedToken {
            token,
            expires_in: ttl,
        })
    }

    /// Revokes exactly the presented token; other sessions stay live.
    pub async fn revoke_token(&self, token_hash: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM access_tokens WHERE token_hash = $1"#)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn fetch_role_details(&self, user: &User) -> Result<Option<RoleDetails>> {
        let details = match user.role {
            Role::Admin => {
                sqlx::query_as::<_, AdminProfile>(r#"SELECT * FROM admins WHERE user_id = $1"#)
                    .bind(user.id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(RoleDetails::Admin)
            }
            Role::Teacher => {
                sqlx::query_as::<_, TeacherProfile>(
                    r#"SELECT * FROM teachers WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?
                .map(RoleDetails::Teacher)
            }
            Role::Student => {
                sqlx::query_as::<_, StudentProfile>(
                    r#"SELECT * FROM students WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?
                .map(RoleDetails::Student)
            }
        };
        Ok(details)
    }

    async fn ensure_username_free(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
    ) -> Result<()> {
        let taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)"#)
                .bind(username)
                .fetch_one(&mut **tx)
                .await?;
        if taken {
            return Err(Error::Unprocessable("Username is already taken".into()));
        }
        Ok(())
    }

    async fn insert_user(
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        let password_hash = hash_password(password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&mut **tx)
        .await?;
        Ok(user)
    }
}
