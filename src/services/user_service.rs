use crate::dto::user_dto::{
    StudentListItem, StudentWithUser, TeacherListItem, UpdateUserPayload,
};
use crate::error::{Error, Result};
use crate::models::profile::{StudentProfile, TeacherProfile};
use crate::models::user::{Role, User};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn teacher_for_user(&self, user_id: Uuid) -> Result<TeacherProfile> {
        sqlx::query_as::<_, TeacherProfile>(r#"SELECT * FROM teachers WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Teacher profile not found for current user".into()))
    }

    pub async fn student_for_user(&self, user_id: Uuid) -> Result<StudentProfile> {
        sqlx::query_as::<_, StudentProfile>(r#"SELECT * FROM students WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Student record not found".into()))
    }

    pub async fn get_student(&self, user_id: Uuid) -> Result<StudentWithUser> {
        let user = self.user_with_role(user_id, Role::Student).await?;
        let student = self.student_for_user(user.id).await?;
        Ok(StudentWithUser { user, student })
    }

    pub async fn list_teachers(&self) -> Result<Vec<TeacherListItem>> {
        let teachers = sqlx::query_as::<_, TeacherListItem>(
            r#"
            SELECT t.id AS teacher_id, t.user_id, t.teacher_name, t.teacher_email,
                   t.teacher_position, u.username
            FROM teachers t
            JOIN users u ON u.id = t.user_id
            ORDER BY t.teacher_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(teachers)
    }

    pub async fn list_students(&self) -> Result<Vec<StudentListItem>> {
        let students = sqlx::query_as::<_, StudentListItem>(
            r#"
            SELECT s.id AS student_id, s.user_id, s.student_name, s.student_lrn,
                   s.student_grade, s.student_section, u.username
            FROM students s
            JOIN users u ON u.id = s.user_id
            ORDER BY s.student_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    /// Admin-only raw listing; password hashes are never serialized.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at ASC"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Teachers may edit only student users; admins may edit student and
    /// teacher users. Role itself is immutable.
    pub async fn update_user(
        &self,
        actor_role: Role,
        target_user_id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<()> {
        let target = self.find_user(target_user_id).await?;
        Self::check_role_matrix(actor_role, target.role)?;

        let mut tx = self.pool.begin().await?;

        if let Some(username) = &payload.username {
            sqlx::query(r#"UPDATE users SET username = $2, updated_at = NOW() WHERE id = $1"#)
                .bind(target.id)
                .bind(username)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_unique_violation(e, "users_username_key", "Username is already taken")
                })?;
        }

        match target.role {
            Role::Teacher => {
                sqlx::query(
                    r#"
                    UPDATE teachers
                    SET teacher_name = COALESCE($2, teacher_name),
                        teacher_email = COALESCE($3, teacher_email),
                        teacher_position = COALESCE($4, teacher_position),
                        updated_at = NOW()
                    WHERE user_id = $1
                    "#,
                )
                .bind(target.id)
                .bind(&payload.teacher_name)
                .bind(&payload.teacher_email)
                .bind(&payload.teacher_position)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_unique_violation(
                        e,
                        "teachers_teacher_email_key",
                        "Teacher email is already taken",
                    )
                })?;
            }
            Role::Student => {
                sqlx::query(
                    r#"
                    UPDATE students
                    SET student_name = COALESCE($2, student_name),
                        student_lrn = COALESCE($3, student_lrn),
                        student_grade = COALESCE($4, student_grade),
                        student_section = COALESCE($5, student_section),
                        updated_at = NOW()
                    WHERE user_id = $1
                    "#,
                )
                .bind(target.id)
                .bind(&payload.student_name)
                .bind(&payload.student_lrn)
                .bind(&payload.student_grade)
                .bind(&payload.student_section)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_unique_violation(
                        e,
                        "students_student_lrn_key",
                        "Student LRN is already taken",
                    )
                })?;
            }
            Role::Admin => {}
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletion cascades to the role profile via FK, never to other records.
    pub async fn delete_user(&self, actor_role: Role, target_user_id: Uuid) -> Result<()> {
        let target = self.find_user(target_user_id).await?;
        Self::check_role_matrix(actor_role, target.role)?;

        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(target.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn check_role_matrix(actor: Role, target: Role) -> Result<()> {
        let allowed = match actor {
            Role::Teacher => target == Role::Student,
            Role::Admin => matches!(target, Role::Student | Role::Teacher),
            Role::Student => false,
        };
        if !allowed {
            return Err(Error::Forbidden(format!(
                "{}s cannot modify {} accounts",
                actor, target
            )));
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".into()))
    }

    async fn user_with_role(&self, id: Uuid, role: Role) -> Result<User> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1 AND role = $2"#)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} not found", capitalize(role.as_str()))))
    }
}

fn map_unique_violation(err: sqlx::Error, constraint: &str, message: &str) -> Error {
    if let sqlx::Error::Database(db) = &err {
        if db.constraint() == Some(constraint) {
            return Error::Unprocessable(message.to_string());
        }
    }
    err.into()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
