use attendance_portal::{
    config::AttendanceApiConfig,
    domain::AttendanceSummary,
    integrations::{AttendanceSource, HttpAttendanceGateway},
};
use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const SLOW_ANSWER: Duration = Duration::from_secs(4);

/// Serves a fake attendance API on an ephemeral port and returns its base URL.
async fn spawn_backend() -> anyhow::Result<String> {
    let app = Router::new()
        .route(
            "/api/attendance/:id",
            get(|Path(id): Path<String>| async move {
                if id == "slow" {
                    tokio::time::sleep(SLOW_ANSWER).await;
                }
                if id == "S1" {
                    Ok(Json(json!({
                        "percentage": 87.5,
                        "total_days": 40,
                        "present_days": 35,
                        "absent_days": 5
                    })))
                } else if id == "broken" {
                    Ok(Json(json!({ "unexpected": true })))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route(
            "/api/attendance/:id/logs",
            get(|Path(id): Path<String>| async move {
                if id == "slow" {
                    tokio::time::sleep(SLOW_ANSWER).await;
                }
                let logs: Value = if id == "S1" {
                    json!([
                        { "date": "2024-04-29", "status": "present", "check_in": "08:00", "check_out": "15:00" },
                        { "date": "2024-04-30", "status": "absent", "remarks": "sick" }
                    ])
                } else {
                    json!([])
                };
                Json(logs)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}/api", addr))
}

fn gateway(base_url: String) -> anyhow::Result<HttpAttendanceGateway> {
    gateway_with_timeout(base_url, 5)
}

fn gateway_with_timeout(base_url: String, timeout_secs: u64) -> anyhow::Result<HttpAttendanceGateway> {
    Ok(HttpAttendanceGateway::new(&AttendanceApiConfig {
        base_url,
        timeout_secs,
    })?)
}

#[tokio::test]
async fn test_summary_and_logs_are_passed_through() -> anyhow::Result<()> {
    let gw = gateway(spawn_backend().await?)?;

    let summary = gw.summary("S1").await;
    assert_eq!(summary.present_days, 35);
    assert_eq!(summary.percentage, 87.5);

    let logs = gw.logs("S1").await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].check_in.as_deref(), Some("08:00"));
    assert_eq!(logs[1].remarks.as_deref(), Some("sick"));
    Ok(())
}

#[tokio::test]
async fn test_bad_answers_fall_back_to_defaults() -> anyhow::Result<()> {
    let gw = gateway(spawn_backend().await?)?;

    assert_eq!(gw.summary("missing").await, AttendanceSummary::zeroed());
    assert_eq!(gw.summary("broken").await, AttendanceSummary::zeroed());
    assert!(gw.logs("missing").await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_yields_zeroes() -> anyhow::Result<()> {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let gw = gateway(format!("http://{}/api", addr))?;

    assert_eq!(gw.summary("S1").await, AttendanceSummary::zeroed());
    assert!(gw.logs("S1").await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_slow_service_times_out_to_defaults() -> anyhow::Result<()> {
    let gw = gateway_with_timeout(spawn_backend().await?, 1)?;

    let started = Instant::now();
    assert_eq!(gw.summary("slow").await, AttendanceSummary::zeroed());
    assert!(gw.logs("slow").await.is_empty());
    let elapsed = started.elapsed();

    // Two calls, each cut off after a second, well before the backend answers.
    assert!(elapsed < SLOW_ANSWER, "took {:?}", elapsed);
    Ok(())
}
