pub mod templates;
pub mod portal;
pub mod uploads;

use axum::{
    Router,
    middleware,
    routing::get,
};
use tower_http::services::ServeDir;

use crate::api::{middleware::auth, state::AppState};

pub fn create_web_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(portal::home::index))
        .route("/about", get(portal::home::about))
        // Auth pages
        .route("/login", get(templates::auth::login_page).post(templates::auth::login_handler))
        .route("/register", get(templates::auth::register_page).post(templates::auth::register_handler))
        .route("/logout", get(templates::auth::logout_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::optional_auth));

    // Role guards run inside each group, after authentication below
    let protected = Router::new()
        .route("/dashboard", get(portal::home::dashboard))
        .nest("/student", portal::student_routes())
        .nest("/parent", portal::parent_routes())
        .nest("/teacher", portal::teacher_routes())
        .nest("/admin", portal::admin_routes())
        .nest("/announcements", portal::announcements::announcement_routes(&state))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth_redirect));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.settings.uploads.dir))
        .with_state(state)
}
