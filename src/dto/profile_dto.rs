use serde::Serialize;

use crate::dto::auth_dto::RoleDetails;
use crate::models::profile::{AdminProfile, StudentProfile, TeacherProfile};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileMeResponse {
    pub user: User,
    pub role: Role,
    pub details: Option<RoleDetails>,
}

impl ProfileMeResponse {
    pub fn admin(user: User, admin: Option<AdminProfile>) -> Self {
        let role = user.role;
        Self {
            user,
            role,
            details: admin.map(RoleDetails::Admin),
        }
    }

    pub fn teacher(user: User, teacher: Option<TeacherProfile>) -> Self {
        let role = user.role;
        Self {
            user,
            role,
            details: teacher.map(RoleDetails::Teacher),
        }
    }

    pub fn student(user: User, student: Option<StudentProfile>) -> Self {
        let role = user.role;
        Self {
            user,
            role,
            details: student.map(RoleDetails::Student),
        }
    }
}
