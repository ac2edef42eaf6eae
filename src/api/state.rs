use std::sync::Arc;
use sqlx::SqlitePool;
use crate::{
    auth::AuthService,
    config::Settings,
    error::Result,
    integrations::AttendanceSource,
    repository::{SqliteAnnouncementRepository, SqliteDepartmentRepository, SqliteUserRepository},
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            settings,
        }
    }

    /// Wires the SQLite repositories and services around an open pool.
    pub fn build(
        db_pool: SqlitePool,
        attendance: Arc<dyn AttendanceSource>,
        settings: Settings,
    ) -> Result<Self> {
        let user_repo = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let department_repo = Arc::new(SqliteDepartmentRepository::new(db_pool.clone()));
        let announcement_repo = Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(user_repo.clone(), &settings.auth)?);

        let service_context = Arc::new(ServiceContext::new(
            user_repo,
            department_repo,
            announcement_repo,
            attendance,
            auth_service,
            db_pool,
        ));

        Ok(Self::new(service_context, Arc::new(settings)))
    }
}
