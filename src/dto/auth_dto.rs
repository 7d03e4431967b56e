use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::classroom_dto::StudentClassSummary;
use crate::models::profile::{AdminProfile, StudentProfile, TeacherProfile};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterAdminPayload {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 6))]
    pub admin_password: String,
    #[validate(length(min = 1))]
    pub admin_security_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterTeacherPayload {
    #[validate(length(min = 1))]
    pub teacher_username: String,
    #[validate(email)]
    pub teacher_email: String,
    #[validate(length(min = 6))]
    pub teacher_password: String,
    #[validate(length(min = 1))]
    pub teacher_name: String,
    #[validate(length(min = 1))]
    pub teacher_position: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterStudentPayload {
    #[validate(length(min = 1))]
    pub student_username: String,
    #[validate(length(min = 6))]
    pub student_password: String,
    #[validate(length(min = 1))]
    pub student_name: String,
    #[validate(length(min = 1))]
    pub student_lrn: String,
    #[validate(length(min = 1))]
    pub student_grade: String,
    #[validate(length(min = 1))]
    pub student_section: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1))]
    pub login: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminLoginPayload {
    #[validate(length(min = 1))]
    pub login: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub admin_security_code: Option<String>,
}

/// Role profile attached to the login response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RoleDetails {
    Admin(AdminProfile),
    Teacher(TeacherProfile),
    Student(StudentProfile),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub role: Role,
    pub user: User,
    pub details: Option<RoleDetails>,
    /// Current classroom summary, resolved eagerly for students so the client
    /// skips a round trip. Null for other roles and for unenrolled students.
    pub student_class: Option<StudentClassSummary>,
}
