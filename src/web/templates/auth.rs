use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::{safe_next_path, AuthService},
    domain::{RegisterRequest, Role},
    error::{validation_messages, AppError},
    web::templates::{HtmlTemplate, Nav},
};

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub registered: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    /// Checkbox; present only when ticked.
    pub remember_me: Option<String>,
    pub next: Option<String>,
}

// GET /login
pub async fn login_page(
    current_user: Option<Extension<CurrentUser>>,
    Query(query): Query<LoginQuery>,
) -> Response {
    if current_user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    let notice = query
        .registered
        .map(|_| "Registration successful! Please log in.".to_string());

    HtmlTemplate(LoginTemplate {
        nav: Nav::anonymous(),
        username: String::new(),
        next: safe_next_path(query.next.as_deref()).unwrap_or_default().to_string(),
        error: None,
        notice,
    })
    .into_response()
}

// POST /login
pub async fn login_handler(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current_user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let next = safe_next_path(form.next.as_deref()).map(str::to_string);
    let render_error = |status: StatusCode, message: String| {
        (
            status,
            HtmlTemplate(LoginTemplate {
                nav: Nav::anonymous(),
                username: form.username.clone(),
                next: next.clone().unwrap_or_default(),
                error: Some(message),
                notice: None,
            }),
        )
            .into_response()
    };

    if let Err(errors) = form.validate() {
        let message = validation_messages(&errors).join(" ");
        return Ok(render_error(StatusCode::UNPROCESSABLE_ENTITY, message));
    }

    let auth = &state.service_context.auth_service;
    let user = match auth.login(form.username.trim(), &form.password).await {
        Ok(user) => user,
        Err(AppError::InvalidCredentials) => {
            return Ok(render_error(
                StatusCode::UNAUTHORIZED,
                AppError::InvalidCredentials.to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    let remember_me = form.remember_me.is_some();
    let (_, token) = auth.issue_session(&user, remember_me)?;
    let cookie = auth.create_session_cookie(&token, remember_me, state.settings.server.secure_cookies);

    let target = next.unwrap_or_else(|| user.role.dashboard_path().to_string());
    Ok((jar.add(cookie), Redirect::to(&target)).into_response())
}

// GET /logout
pub async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    (jar.add(AuthService::create_logout_cookie()), Redirect::to("/login"))
}

pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub parent_student_id: String,
    pub roles: Vec<RoleOption>,
    pub errors: Vec<String>,
}

impl RegisterTemplate {
    fn blank() -> Self {
        Self {
            nav: Nav::anonymous(),
            username: String::new(),
            email: String::new(),
            full_name: String::new(),
            student_id: String::new(),
            parent_student_id: String::new(),
            roles: role_options(Some(Role::Student)),
            errors: Vec::new(),
        }
    }

    fn refill(form: &RegisterForm, errors: Vec<String>) -> Self {
        Self {
            nav: Nav::anonymous(),
            username: form.username.clone(),
            email: form.email.clone(),
            full_name: form.full_name.clone(),
            student_id: form.student_id.clone().unwrap_or_default(),
            parent_student_id: form.parent_student_id.clone().unwrap_or_default(),
            roles: role_options(form.role.parse().ok()),
            errors,
        }
    }
}

fn role_options(selected: Option<Role>) -> Vec<RoleOption> {
    Role::ALL
        .into_iter()
        .filter(Role::is_self_registrable)
        .map(|role| RoleOption {
            value: role.as_str(),
            label: role.label(),
            selected: Some(role) == selected,
        })
        .collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, max = 64, message = "Username must be between 3 and 64 characters."))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 2, max = 128, message = "Full name must be between 2 and 128 characters."))]
    pub full_name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password2: String,
    pub role: String,
    #[validate(length(max = 20, message = "Student ID must be at most 20 characters."))]
    pub student_id: Option<String>,
    #[validate(length(max = 20, message = "Linked student ID must be at most 20 characters."))]
    pub parent_student_id: Option<String>,
}

impl RegisterForm {
    /// Lengths are checked on what will be stored, so surrounding blanks go first.
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            student_id: self.student_id.map(|v| v.trim().to_string()),
            parent_student_id: self.parent_student_id.map(|v| v.trim().to_string()),
            ..self
        }
    }
}

// GET /register
pub async fn register_page(current_user: Option<Extension<CurrentUser>>) -> Response {
    if current_user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    HtmlTemplate(RegisterTemplate::blank()).into_response()
}

// POST /register
pub async fn register_handler(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if current_user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let form = form.trimmed();
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_messages(&e),
    };

    let role = form.role.parse::<Role>().ok().filter(Role::is_self_registrable);
    if role.is_none() {
        errors.push("Invalid role selected.".to_string());
    }

    let Some(role) = role.filter(|_| errors.is_empty()) else {
        return Ok(rejected(&form, errors));
    };

    let request = RegisterRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        full_name: form.full_name.clone(),
        password: form.password.clone(),
        role,
        student_id: form.student_id.clone(),
        parent_student_id: form.parent_student_id.clone(),
    };

    match state.service_context.user_service.register(request).await {
        Ok(_) => Ok(Redirect::to("/login?registered=1").into_response()),
        Err(AppError::Validation(message)) => Ok(rejected(&form, vec![message])),
        Err(e) => Err(e),
    }
}

fn rejected(form: &RegisterForm, errors: Vec<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        HtmlTemplate(RegisterTemplate::refill(form, errors)),
    )
        .into_response()
}
