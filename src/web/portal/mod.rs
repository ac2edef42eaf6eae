pub mod admin;
pub mod announcements;
pub mod home;
pub mod parent;
pub mod student;
pub mod teacher;

use std::collections::HashMap;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use crate::{
    api::{middleware::auth, state::AppState},
    domain::{Announcement, AttendanceEntry, AttendanceSummary, User},
    error::Result,
    service::announcement_service::AnnouncementService,
    web::templates::{format_due_date, format_timestamp},
};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(student::dashboard))
        .route("/attendance", get(student::attendance))
        .route("/announcements", get(student::announcements))
        .route_layer(middleware::from_fn(auth::require_student))
}

pub fn parent_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(parent::dashboard))
        .route("/attendance", get(parent::attendance))
        .route("/announcements", get(parent::announcements))
        .route_layer(middleware::from_fn(auth::require_parent))
}

pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(teacher::dashboard))
        .route("/students", get(teacher::students))
        .route("/attendance", get(teacher::attendance))
        .route_layer(middleware::from_fn(auth::require_teacher_or_admin))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/users/:id/department", post(admin::assign_department))
        .route("/users/:id/active", post(admin::set_active))
        .route("/departments", get(admin::departments).post(admin::create_department))
        .route("/reports", get(admin::reports))
        .route_layer(middleware::from_fn(auth::require_admin))
}

/// An announcement prepared for display, with author and department resolved.
pub struct AnnouncementCard {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub kind: String,
    pub kind_label: String,
    pub department_name: String,
    pub author_name: String,
    pub created_at: String,
    pub due_date: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub is_active: bool,
    pub can_delete: bool,
}

/// Builds display cards, looking each author and department up once.
pub async fn announcement_cards(
    state: &AppState,
    viewer: &User,
    announcements: Vec<Announcement>,
) -> Result<Vec<AnnouncementCard>> {
    let ctx = &state.service_context;

    let departments: HashMap<i64, String> = ctx
        .department_repo
        .list()
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let mut authors: HashMap<i64, String> = HashMap::new();
    for announcement in &announcements {
        if authors.contains_key(&announcement.author_id) {
            continue;
        }
        let name = ctx
            .user_repo
            .find_by_id(announcement.author_id)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_else(|| "Unknown".to_string());
        authors.insert(announcement.author_id, name);
    }

    Ok(announcements
        .into_iter()
        .map(|a| {
            let can_delete = AnnouncementService::can_delete(viewer, &a) && a.is_active;
            AnnouncementCard {
                id: a.id,
                kind: a.announcement_type.as_str().to_string(),
                kind_label: a.announcement_type.label().to_string(),
                department_name: departments
                    .get(&a.department_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                author_name: authors
                    .get(&a.author_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                created_at: format_timestamp(&a.created_at),
                due_date: a.due_date.as_ref().map(format_due_date),
                file_url: a.file_path.as_ref().map(|p| format!("/uploads/{}", urlencoding::encode(p))),
                file_name: a.file_name.clone(),
                is_active: a.is_active,
                can_delete,
                title: a.title,
                content: a.content,
            }
        })
        .collect())
}

/// Attendance summary with the percentage pre-formatted.
pub struct SummaryView {
    pub percentage: String,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
}

impl From<&AttendanceSummary> for SummaryView {
    fn from(summary: &AttendanceSummary) -> Self {
        Self {
            percentage: format!("{:.1}", summary.percentage),
            total_days: summary.total_days,
            present_days: summary.present_days,
            absent_days: summary.absent_days,
        }
    }
}

pub struct LogRow {
    pub date: String,
    pub status: String,
    pub check_in: String,
    pub check_out: String,
    pub remarks: String,
}

impl From<AttendanceEntry> for LogRow {
    fn from(entry: AttendanceEntry) -> Self {
        Self {
            date: entry.date,
            status: entry.status,
            check_in: entry.check_in.unwrap_or_else(|| "-".to_string()),
            check_out: entry.check_out.unwrap_or_else(|| "-".to_string()),
            remarks: entry.remarks.unwrap_or_default(),
        }
    }
}
