use askama::Template;
use axum::{
    extract::State,
    response::IntoResponse,
    Extension,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::User,
    error::AppError,
    web::templates::{format_date, HtmlTemplate, Nav},
};
use super::{announcement_cards, AnnouncementCard, SummaryView};

const NO_DEPARTMENT: &str = "You are not assigned to any department.";

#[derive(Template)]
#[template(path = "teacher/dashboard.html")]
pub struct TeacherDashboardTemplate {
    pub nav: Nav,
    pub department_name: Option<String>,
    pub students_count: i64,
    pub announcements: Vec<AnnouncementCard>,
}

pub struct StudentRow {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub student_id: String,
    pub joined: String,
}

impl From<&User> for StudentRow {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            student_id: user.student_id.clone().unwrap_or_else(|| "-".to_string()),
            joined: format_date(&user.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "teacher/students.html")]
pub struct TeacherStudentsTemplate {
    pub nav: Nav,
    pub notice: Option<String>,
    pub students: Vec<StudentRow>,
}

pub struct AttendanceRow {
    pub student: StudentRow,
    pub summary: Option<SummaryView>,
}

#[derive(Template)]
#[template(path = "teacher/attendance.html")]
pub struct TeacherAttendanceTemplate {
    pub nav: Nav,
    pub notice: Option<String>,
    pub rows: Vec<AttendanceRow>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.service_context.dashboard_service.teacher(&current_user.user).await?;

    Ok(HtmlTemplate(TeacherDashboardTemplate {
        nav: Nav::for_user(&current_user.user),
        department_name: view.department.map(|d| d.name),
        students_count: view.students_count,
        announcements: announcement_cards(&state, &current_user.user, view.announcements).await?,
    }))
}

pub async fn students(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let students = state
        .service_context
        .dashboard_service
        .department_students(&current_user.user)
        .await?;

    let (notice, students) = match students {
        Some(list) => (None, list.iter().map(StudentRow::from).collect()),
        None => (Some(NO_DEPARTMENT.to_string()), Vec::new()),
    };

    Ok(HtmlTemplate(TeacherStudentsTemplate {
        nav: Nav::for_user(&current_user.user),
        notice,
        students,
    }))
}

pub async fn attendance(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .service_context
        .dashboard_service
        .department_attendance(&current_user.user)
        .await?;

    let (notice, rows) = match rows {
        Some(rows) => (
            None,
            rows.iter()
                .map(|(user, summary)| AttendanceRow {
                    student: StudentRow::from(user),
                    summary: summary.as_ref().map(SummaryView::from),
                })
                .collect(),
        ),
        None => (Some(NO_DEPARTMENT.to_string()), Vec::new()),
    };

    Ok(HtmlTemplate(TeacherAttendanceTemplate {
        nav: Nav::for_user(&current_user.user),
        notice,
        rows,
    }))
}
