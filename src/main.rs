use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attendance_portal::{
    api::{self, state::AppState},
    config::Settings,
    integrations::{AttendanceSource, HttpAttendanceGateway},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_portal=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting attendance portal on {}", settings.bind_address());

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    tokio::fs::create_dir_all(&settings.uploads.dir).await?;

    let gateway = HttpAttendanceGateway::new(&settings.attendance)?;
    tracing::info!(
        "Attendance data from {} ({})",
        settings.attendance.base_url,
        gateway.name()
    );
    let attendance: Arc<dyn AttendanceSource> = Arc::new(gateway);

    let bind_address = settings.bind_address();
    let app_state = AppState::build(db_pool, attendance, settings)?;
    let app = api::create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
