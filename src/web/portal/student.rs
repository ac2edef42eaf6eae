use askama::Template;
use axum::{
    extract::State,
    response::IntoResponse,
    Extension,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::KindFilter,
    error::AppError,
    web::templates::{HtmlTemplate, Nav},
};
use super::{announcement_cards, AnnouncementCard, LogRow, SummaryView};

#[derive(Template)]
#[template(path = "student/dashboard.html")]
pub struct StudentDashboardTemplate {
    pub nav: Nav,
    pub student_id: Option<String>,
    pub attendance: Option<SummaryView>,
    pub announcements: Vec<AnnouncementCard>,
}

#[derive(Template)]
#[template(path = "student/attendance.html")]
pub struct StudentAttendanceTemplate {
    pub nav: Nav,
    pub student_id: Option<String>,
    pub attendance: Option<SummaryView>,
    pub logs: Vec<LogRow>,
}

#[derive(Template)]
#[template(path = "student/announcements.html")]
pub struct StudentAnnouncementsTemplate {
    pub nav: Nav,
    pub announcements: Vec<AnnouncementCard>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.service_context.dashboard_service.student(&current_user.user).await?;

    Ok(HtmlTemplate(StudentDashboardTemplate {
        nav: Nav::for_user(&current_user.user),
        student_id: view.student_id,
        attendance: view.attendance.as_ref().map(SummaryView::from),
        announcements: announcement_cards(&state, &current_user.user, view.announcements).await?,
    }))
}

pub async fn attendance(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> impl IntoResponse {
    let detail = state
        .service_context
        .dashboard_service
        .attendance_detail(current_user.user.student_id.as_deref())
        .await;

    HtmlTemplate(StudentAttendanceTemplate {
        nav: Nav::for_user(&current_user.user),
        student_id: detail.student_id,
        attendance: detail.summary.as_ref().map(SummaryView::from),
        logs: detail.logs.into_iter().map(LogRow::from).collect(),
    })
}

pub async fn announcements(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let all = state
        .service_context
        .announcement_service
        .list(KindFilter::All)
        .await?;

    Ok(HtmlTemplate(StudentAnnouncementsTemplate {
        nav: Nav::for_user(&current_user.user),
        announcements: announcement_cards(&state, &current_user.user, all).await?,
    }))
}
