use askama::Template;
use axum::{
    response::{IntoResponse, Redirect},
    Extension,
};

use crate::{
    api::middleware::auth::CurrentUser,
    web::templates::{HtmlTemplate, Nav},
};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

pub async fn index(current_user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    HtmlTemplate(IndexTemplate {
        nav: Nav::from_optional(current_user.as_ref().map(|c| &c.user)),
    })
}

pub async fn about(current_user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    HtmlTemplate(AboutTemplate {
        nav: Nav::from_optional(current_user.as_ref().map(|c| &c.user)),
    })
}

/// Sends each role to its own dashboard.
pub async fn dashboard(Extension(current_user): Extension<CurrentUser>) -> Redirect {
    Redirect::to(current_user.user.role.dashboard_path())
}
