pub mod user_service;
pub mod announcement_service;
pub mod dashboard_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::integrations::AttendanceSource;
use crate::auth::AuthService;
use user_service::UserService;
use announcement_service::AnnouncementService;
use dashboard_service::DashboardService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub department_repo: Arc<dyn DepartmentRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub attendance: Arc<dyn AttendanceSource>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub dashboard_service: Arc<DashboardService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        department_repo: Arc<dyn DepartmentRepository>,
        announcement_repo: Arc<dyn AnnouncementRepository>,
        attendance: Arc<dyn AttendanceSource>,
        auth_service: Arc<AuthService>,
        db_pool: SqlitePool,
    ) -> Self {
        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            department_repo.clone(),
        ));
        let announcement_service = Arc::new(AnnouncementService::new(announcement_repo.clone()));
        let dashboard_service = Arc::new(DashboardService::new(
            user_repo.clone(),
            department_repo.clone(),
            announcement_repo.clone(),
            attendance.clone(),
        ));

        Self {
            user_repo,
            department_repo,
            announcement_repo,
            attendance,
            auth_service,
            user_service,
            announcement_service,
            dashboard_service,
            db_pool,
        }
    }
}
