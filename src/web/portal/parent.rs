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

const NO_LINKED_STUDENT: &str = "No student linked to your account. Please contact admin.";

#[derive(Template)]
#[template(path = "parent/dashboard.html")]
pub struct ParentDashboardTemplate {
    pub nav: Nav,
    pub student_id: Option<String>,
    pub notice: Option<String>,
    pub attendance: Option<SummaryView>,
    pub announcements: Vec<AnnouncementCard>,
}

#[derive(Template)]
#[template(path = "parent/attendance.html")]
pub struct ParentAttendanceTemplate {
    pub nav: Nav,
    pub student_id: Option<String>,
    pub notice: Option<String>,
    pub attendance: Option<SummaryView>,
    pub logs: Vec<LogRow>,
}

#[derive(Template)]
#[template(path = "parent/announcements.html")]
pub struct ParentAnnouncementsTemplate {
    pub nav: Nav,
    pub announcements: Vec<AnnouncementCard>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.service_context.dashboard_service.parent(&current_user.user).await?;
    let notice = view.student_id.is_none().then(|| NO_LINKED_STUDENT.to_string());

    Ok(HtmlTemplate(ParentDashboardTemplate {
        nav: Nav::for_user(&current_user.user),
        student_id: view.student_id,
        notice,
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
        .attendance_detail(current_user.user.parent_student_id.as_deref())
        .await;
    let notice = detail.student_id.is_none().then(|| NO_LINKED_STUDENT.to_string());

    HtmlTemplate(ParentAttendanceTemplate {
        nav: Nav::for_user(&current_user.user),
        student_id: detail.student_id,
        notice,
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

    Ok(HtmlTemplate(ParentAnnouncementsTemplate {
        nav: Nav::for_user(&current_user.user),
        announcements: announcement_cards(&state, &current_user.user, all).await?,
    }))
}
