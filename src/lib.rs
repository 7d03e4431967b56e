pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{
    auth_service::AuthService, classroom_service::ClassroomService,
    enrollment_service::EnrollmentService, material_service::MaterialService,
    profile_service::ProfileService, progress_service::ProgressService, task_service::TaskService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub classroom_service: ClassroomService,
    pub enrollment_service: EnrollmentService,
    pub material_service: MaterialService,
    pub profile_service: ProfileService,
    pub progress_service: ProgressService,
    pub task_service: TaskService,
    pub user_service: UserService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let auth_service = AuthService::new(pool.clone());
        let classroom_service = ClassroomService::new(pool.clone());
        let enrollment_service = EnrollmentService::new(pool.clone());
        let material_service = MaterialService::new(pool.clone());
        let profile_service = ProfileService::new(pool.clone());
        let progress_service = ProgressService::new(pool.clone());
        let task_service = TaskService::new(pool.clone());
        let user_service = UserService::new(pool.clone());

        Self {
            pool,
            auth_service,
            classroom_service,
            enrollment_service,
            material_service,
            profile_service,
            progress_service,
            task_service,
            user_service,
        }
    }
}

/// Full application router, shared by the binary and the integration tests.
pub fn build_router(state: AppState) -> Router {
    let config = config::get_config();

    let public_api = Router::new()
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/admin/login", post(routes::auth::admin_login))
        .route("/api/register/admin", post(routes::auth::register_admin))
        .route("/api/register/teacher", post(routes::auth::register_teacher))
        .route("/api/register/student", post(routes::auth::register_student))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.auth_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let authenticated_api = Router::new()
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/profile/me", get(routes::profile::me))
        .route("/api/grades", get(routes::task::list_grades))
        .route("/api/students/:id", get(routes::user::get_student))
        .route(
            "/api/progress/:student_id",
            get(routes::progress::show_progress),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let teacher_api = Router::new()
        .route(
            "/api/classrooms",
            post(routes::classroom::create_classroom).get(routes::classroom::list_classrooms),
        )
        .route(
            "/api/classrooms/:id",
            get(routes::classroom::get_classroom)
                .put(routes::classroom::update_classroom)
                .delete(routes::classroom::delete_classroom),
        )
        .route(
            "/api/classrooms/:id/students",
            get(routes::classroom::get_assigned_students),
        )
        .route(
            "/api/classrooms/:id/background",
            post(routes::classroom::upload_background),
        )
        .route(
            "/api/classrooms/assign-student",
            post(routes::classroom::assign_student),
        )
        .route(
            "/api/classrooms/unassign-student",
            post(routes::classroom::unassign_student),
        )
        .route(
            "/api/classrooms/students/unassigned",
            get(routes::classroom::get_unassigned_students),
        )
        .route(
            "/api/profile/teacher/upload",
            post(routes::profile::upload_teacher_picture),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_teacher,
        ));

    let staff_api = Router::new()
        .route("/api/teachers", get(routes::user::get_all_teachers))
        .route("/api/teachers/students", get(routes::user::get_all_students))
        .route(
            "/api/teachers/users/:id",
            axum::routing::put(routes::user::update_user).delete(routes::user::delete_user),
        )
        .route(
            "/api/teachers/materials",
            post(routes::material::upload_material),
        )
        .route(
            "/api/teachers/materials/:id",
            get(routes::material::get_by_classroom).delete(routes::material::delete_material),
        )
        .route(
            "/api/teachers/materials/:id/type/:material_type",
            get(routes::material::get_by_type),
        )
        .route(
            "/api/progress/reset/:student_id/:task_id",
            post(routes::progress::reset_attempts),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_staff,
        ));

    let student_api = Router::new()
        .route("/api/classrooms/join", post(routes::classroom::join_class))
        .route("/api/students/my-classes", get(routes::classroom::my_classes))
        .route(
            "/api/students/materials",
            get(routes::material::my_classroom_materials),
        )
        .route("/api/grades/:grade_id/tasks", get(routes::task::grade_tasks))
        .route("/api/progress", post(routes::progress::submit_progress))
        .route(
            "/api/profile/student/upload",
            post(routes::profile::upload_student_picture),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_student,
        ));

    let admin_api = Router::new()
        .route("/api/users", get(routes::user::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(public_api)
        .merge(authenticated_api)
        .merge(teacher_api)
        .merge(staff_api)
        .merge(student_api)
        .merge(admin_api)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(config.uploads_dir.clone()),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(110 * 1024 * 1024))
}
