#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use attendance_portal::{
    api::state::AppState,
    config::Settings,
    domain::{AttendanceEntry, AttendanceSummary, Department, NewDepartment, RegisterRequest, Role, User},
    integrations::AttendanceSource,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Attendance source with fixed answers, so tests never touch the network.
pub struct FixedAttendance;

pub const FIXED_SUMMARY: AttendanceSummary = AttendanceSummary {
    percentage: 92.5,
    total_days: 40,
    present_days: 37,
    absent_days: 3,
};

#[async_trait]
impl AttendanceSource for FixedAttendance {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn summary(&self, _student_id: &str) -> AttendanceSummary {
        FIXED_SUMMARY
    }

    async fn logs(&self, _student_id: &str) -> Vec<AttendanceEntry> {
        vec![AttendanceEntry {
            date: "2024-04-29".to_string(),
            status: "present".to_string(),
            check_in: Some("08:01".to_string()),
            check_out: Some("15:30".to_string()),
            remarks: None,
        }]
    }
}

pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    // One connection that never expires, or the in-memory database is lost.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub struct TestApp {
    pub state: AppState,
    pub uploads: tempfile::TempDir,
}

pub async fn test_app() -> anyhow::Result<TestApp> {
    test_app_with(Arc::new(FixedAttendance), |_| {}).await
}

/// Like [`test_app`], with a chosen attendance source and adjusted settings.
pub async fn test_app_with(
    attendance: Arc<dyn AttendanceSource>,
    configure: impl FnOnce(&mut Settings),
) -> anyhow::Result<TestApp> {
    let pool = test_pool().await?;
    let uploads = tempfile::tempdir()?;

    let mut settings = Settings::default();
    settings.auth.secret_key = "test-secret".to_string();
    settings.uploads.dir = uploads.path().to_string_lossy().to_string();
    configure(&mut settings);

    let state = AppState::build(pool, attendance, settings)?;
    Ok(TestApp { state, uploads })
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        attendance_portal::api::create_app(self.state.clone())
    }

    pub async fn department(&self, name: &str, code: &str) -> anyhow::Result<Department> {
        Ok(self
            .state
            .service_context
            .user_service
            .create_department(NewDepartment {
                name: name.to_string(),
                code: code.to_string(),
                description: None,
            })
            .await?)
    }

    pub async fn user(&self, username: &str, role: Role, department_id: Option<i64>) -> anyhow::Result<User> {
        Ok(self
            .state
            .service_context
            .user_service
            .create_user(registration(username, role), department_id)
            .await?)
    }

    /// `Cookie` header value carrying a fresh session for `user`.
    pub fn session_cookie(&self, user: &User) -> anyhow::Result<(String, String)> {
        let auth = &self.state.service_context.auth_service;
        let (_, token) = auth.issue_session(user, false)?;
        let csrf = auth.csrf_token(&token);
        Ok((format!("session={}", token), csrf))
    }
}

pub fn registration(username: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: format!("{} Example", username),
        password: "secret123".to_string(),
        role,
        student_id: match role {
            Role::Student => Some(format!("ID-{}", username)),
            _ => None,
        },
        parent_student_id: None,
    }
}
