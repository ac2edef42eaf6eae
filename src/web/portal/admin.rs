use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{verify_csrf, CurrentUser},
        state::AppState,
    },
    domain::{Department, NewDepartment, User},
    error::{validation_messages, AppError},
    service::dashboard_service::AdminStats,
    web::templates::{format_date, HtmlTemplate, Nav},
};

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub nav: Nav,
    pub stats: AdminStats,
    pub recent_users: Vec<UserRow>,
}

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role_label: String,
    /// 0 when unassigned.
    pub department_id: i64,
    pub department_name: String,
    pub is_active: bool,
    pub is_self: bool,
    pub joined: String,
}

impl UserRow {
    fn new(user: &User, departments: &[Department], viewer: &User) -> Self {
        let department_name = user
            .department_id
            .and_then(|id| departments.iter().find(|d| d.id == id))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role_label: user.role.label().to_string(),
            department_id: user.department_id.unwrap_or(0),
            department_name,
            is_active: user.is_active,
            is_self: user.id == viewer.id,
            joined: format_date(&user.created_at),
        }
    }
}

pub struct DepartmentOption {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: String,
    pub created: String,
}

impl From<&Department> for DepartmentOption {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
            code: department.code.clone(),
            description: department.description.clone().unwrap_or_default(),
            created: format_date(&department.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub nav: Nav,
    pub csrf_token: String,
    pub users: Vec<UserRow>,
    pub departments: Vec<DepartmentOption>,
}

#[derive(Template)]
#[template(path = "admin/departments.html")]
pub struct AdminDepartmentsTemplate {
    pub nav: Nav,
    pub csrf_token: String,
    pub departments: Vec<DepartmentOption>,
    pub errors: Vec<String>,
    pub name: String,
    pub code: String,
    pub description: String,
}

pub struct CountRow {
    pub label: String,
    pub count: i64,
}

#[derive(Template)]
#[template(path = "admin/reports.html")]
pub struct AdminReportsTemplate {
    pub nav: Nav,
    pub total_users: i64,
    pub departments: i64,
    pub users_by_role: Vec<CountRow>,
    pub announcements_by_kind: Vec<CountRow>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.service_context.dashboard_service.admin().await?;
    let departments = state.service_context.department_repo.list().await?;

    Ok(HtmlTemplate(AdminDashboardTemplate {
        nav: Nav::for_user(&current_user.user),
        stats: view.stats,
        recent_users: view
            .recent_users
            .iter()
            .map(|u| UserRow::new(u, &departments, &current_user.user))
            .collect(),
    }))
}

pub async fn users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = &state.service_context;
    let users = ctx.user_repo.list().await?;
    let departments = ctx.department_repo.list().await?;

    Ok(HtmlTemplate(AdminUsersTemplate {
        nav: Nav::for_user(&current_user.user),
        csrf_token: current_user.csrf_token(&state),
        users: users
            .iter()
            .map(|u| UserRow::new(u, &departments, &current_user.user))
            .collect(),
        departments: departments.iter().map(DepartmentOption::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AssignDepartmentForm {
    pub csrf_token: String,
    /// Empty clears the assignment.
    pub department_id: String,
}

// POST /admin/users/:id/department
pub async fn assign_department(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Form(form): Form<AssignDepartmentForm>,
) -> Result<Redirect, AppError> {
    verify_csrf(&state, &current_user, &form.csrf_token)?;

    let department_id = match form.department_id.trim() {
        "" => None,
        raw => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::BadRequest("Invalid department".to_string()))?,
        ),
    };

    state
        .service_context
        .user_service
        .assign_department(user_id, department_id)
        .await?;

    tracing::info!(user_id, ?department_id, actor_id = current_user.user.id, "Assigned department");
    Ok(Redirect::to("/admin/users"))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveForm {
    pub csrf_token: String,
    pub is_active: String,
}

// POST /admin/users/:id/active
pub async fn set_active(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    Form(form): Form<SetActiveForm>,
) -> Result<Redirect, AppError> {
    verify_csrf(&state, &current_user, &form.csrf_token)?;

    let is_active = match form.is_active.as_str() {
        "true" => true,
        "false" => false,
        _ => return Err(AppError::BadRequest("Invalid status".to_string())),
    };

    state
        .service_context
        .user_service
        .set_active(&current_user.user, user_id, is_active)
        .await?;

    Ok(Redirect::to("/admin/users"))
}

pub async fn departments(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    render_departments(&state, &current_user, StatusCode::OK, Vec::new(), None).await
}

#[derive(Debug, Deserialize, Validate)]
pub struct DepartmentForm {
    pub csrf_token: String,
    #[validate(length(min = 2, max = 100, message = "Department name must be between 2 and 100 characters."))]
    pub name: String,
    #[validate(length(min = 2, max = 10, message = "Department code must be between 2 and 10 characters."))]
    pub code: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: Option<String>,
}

impl DepartmentForm {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            code: self.code.trim().to_string(),
            description: self.description.map(|v| v.trim().to_string()),
            ..self
        }
    }
}

// POST /admin/departments
pub async fn create_department(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Form(form): Form<DepartmentForm>,
) -> Result<Response, AppError> {
    verify_csrf(&state, &current_user, &form.csrf_token)?;

    let form = form.trimmed();
    if let Err(errors) = form.validate() {
        return render_departments(
            &state,
            &current_user,
            StatusCode::UNPROCESSABLE_ENTITY,
            validation_messages(&errors),
            Some(&form),
        )
        .await;
    }

    let created = state
        .service_context
        .user_service
        .create_department(NewDepartment {
            name: form.name.clone(),
            code: form.code.clone(),
            description: form.description.clone(),
        })
        .await;

    match created {
        Ok(_) => Ok(Redirect::to("/admin/departments").into_response()),
        Err(AppError::Validation(message)) => {
            render_departments(
                &state,
                &current_user,
                StatusCode::UNPROCESSABLE_ENTITY,
                vec![message],
                Some(&form),
            )
            .await
        }
        Err(e) => Err(e),
    }
}

async fn render_departments(
    state: &AppState,
    current_user: &CurrentUser,
    status: StatusCode,
    errors: Vec<String>,
    form: Option<&DepartmentForm>,
) -> Result<Response, AppError> {
    let departments = state.service_context.department_repo.list().await?;

    let page = AdminDepartmentsTemplate {
        nav: Nav::for_user(&current_user.user),
        csrf_token: current_user.csrf_token(state),
        departments: departments.iter().map(DepartmentOption::from).collect(),
        errors,
        name: form.map(|f| f.name.clone()).unwrap_or_default(),
        code: form.map(|f| f.code.clone()).unwrap_or_default(),
        description: form.and_then(|f| f.description.clone()).unwrap_or_default(),
    };

    Ok((status, HtmlTemplate(page)).into_response())
}

pub async fn reports(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.service_context.dashboard_service.admin_report().await?;

    Ok(HtmlTemplate(AdminReportsTemplate {
        nav: Nav::for_user(&current_user.user),
        total_users: report.total_users,
        departments: report.departments,
        users_by_role: report
            .active_by_role
            .iter()
            .map(|(role, count)| CountRow { label: role.label().to_string(), count: *count })
            .collect(),
        announcements_by_kind: report
            .active_by_kind
            .iter()
            .map(|(kind, count)| CountRow { label: kind.label().to_string(), count: *count })
            .collect(),
    }))
}
