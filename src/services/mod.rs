pub mod auth_service;
pub mod classroom_service;
pub mod enrollment_service;
pub mod material_service;
pub mod profile_service;
pub mod progress_service;
pub mod task_service;
pub mod user_service;
