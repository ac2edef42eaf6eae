use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::{guards::{self, Guard}, SESSION_COOKIE},
    domain::User,
    error::AppError,
};

/// The authenticated actor for the current request.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Raw session token; CSRF tokens are derived from it.
    pub session_token: String,
}

impl CurrentUser {
    pub fn csrf_token(&self, state: &AppState) -> String {
        state.service_context.auth_service.csrf_token(&self.session_token)
    }
}

/// Resolves the session cookie to an active user. The role is taken from the
/// stored user, so role changes and deactivation apply on the next request.
pub async fn resolve_current_user(state: &AppState, jar: &CookieJar) -> Option<CurrentUser> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    if token.is_empty() {
        return None;
    }

    let claims = state.service_context.auth_service.validate_session(&token)?;

    let user = match state.service_context.user_repo.find_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!("Failed to load session user: {}", e);
            return None;
        }
    };

    if !user.is_active {
        return None;
    }

    Some(CurrentUser {
        user,
        session_token: token,
    })
}

/// Sends anonymous visitors to the login page, remembering where they were going.
pub async fn require_auth_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_current_user(&state, &jar).await {
        Some(current_user) => {
            request.extensions_mut().insert(current_user);
            next.run(request).await
        }
        None => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            Redirect::to(&format!("/login?next={}", urlencoding::encode(&target))).into_response()
        }
    }
}

pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(current_user) = resolve_current_user(&state, &jar).await {
        request.extensions_mut().insert(current_user);
    }

    next.run(request).await
}

async fn enforce(guard: Guard, request: Request, next: Next) -> Result<Response, AppError> {
    let role = request
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.user.role)
        .ok_or(AppError::Unauthorized)?;

    guards::ensure(role, guard)?;

    Ok(next.run(request).await)
}

pub async fn require_student(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(guards::is_student, request, next).await
}

pub async fn require_parent(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(guards::is_parent, request, next).await
}

pub async fn require_teacher_or_admin(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(guards::is_teacher_or_admin, request, next).await
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(guards::is_admin, request, next).await
}

/// Checks the `csrf_token` field of a state-changing form.
pub fn verify_csrf(state: &AppState, current_user: &CurrentUser, submitted: &str) -> Result<(), AppError> {
    if state
        .service_context
        .auth_service
        .verify_csrf(&current_user.session_token, submitted)
    {
        Ok(())
    } else {
        tracing::warn!(user_id = current_user.user.id, "Rejected form with bad CSRF token");
        Err(AppError::Forbidden)
    }
}
