pub mod auth;

use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{
    auth::guards,
    domain::User,
};

/// Navigation data every page template carries for `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<NavUser>,
}

#[derive(Debug, Clone)]
pub struct NavUser {
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub role_label: String,
    pub dashboard_path: String,
    pub can_post: bool,
    pub is_admin: bool,
}

impl Nav {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            user: Some(NavUser {
                username: user.username.clone(),
                full_name: user.full_name.clone(),
                role: user.role.as_str().to_string(),
                role_label: user.role.label().to_string(),
                dashboard_path: user.role.dashboard_path().to_string(),
                can_post: guards::is_teacher_or_admin(user.role),
                is_admin: guards::is_admin(user.role),
            }),
        }
    }

    pub fn from_optional(user: Option<&User>) -> Self {
        user.map(Self::for_user).unwrap_or_default()
    }
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {}", err),
                ).into_response()
            }
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%B %d, %Y %H:%M").to_string()
}

pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub fn format_due_date(due: &NaiveDateTime) -> String {
    due.format("%Y-%m-%d %H:%M").to_string()
}
