pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    trace::TraceLayer,
};

use crate::web;
use state::AppState;

/// The whole application: health probe, portal pages and stored attachments.
pub fn create_app(app_state: AppState) -> Router {
    let health = Router::new()
        .route("/health", get(handlers::root::health_check))
        .with_state(app_state.clone());

    health
        .merge(web::create_web_routes(app_state))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
