mod common;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use attendance_portal::domain::{
    AnnouncementKind, AttendanceEntry, AttendanceSummary, CreateAnnouncementRequest, Role, User,
};
use axum::{body::{to_bytes, Body}, http::{header, Request, StatusCode}};
use common::{TestApp, FIXED_SUMMARY};
use tower::ServiceExt;

fn notice(title: &str) -> CreateAnnouncementRequest {
    CreateAnnouncementRequest {
        title: title.to_string(),
        content: "Details for the whole class.".to_string(),
        announcement_type: AnnouncementKind::Notice,
        due_date: None,
        file: None,
    }
}

async fn post_many(app: &TestApp, author: &User, prefix: &str, n: usize) -> anyhow::Result<Vec<i64>> {
    let service = &app.state.service_context.announcement_service;
    let mut ids = Vec::with_capacity(n);
    for i in 1..=n {
        ids.push(service.create(author, notice(&format!("{} number {}", prefix, i))).await?.id);
    }
    Ok(ids)
}

#[tokio::test]
async fn test_admin_stats_count_active_users_per_role() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("History", "HIST").await?;
    let admin = app.user("root", Role::Admin, None).await?;
    app.user("stu1", Role::Student, Some(dept.id)).await?;
    let gone = app.user("stu2", Role::Student, Some(dept.id)).await?;
    app.user("par1", Role::Parent, None).await?;
    let teacher = app.user("tea1", Role::Teacher, Some(dept.id)).await?;
    let retired = app.user("tea2", Role::Teacher, Some(dept.id)).await?;

    let users = &app.state.service_context.user_service;
    users.set_active(&admin, gone.id, false).await?;
    users.set_active(&admin, retired.id, false).await?;

    let ids = post_many(&app, &teacher, "History notice", 3).await?;
    app.state.service_context.announcement_service.delete(&teacher, ids[0]).await?;

    let dashboards = &app.state.service_context.dashboard_service;
    let stats = dashboards.admin_stats().await?;
    assert_eq!(stats.total_users, 6);
    assert_eq!(stats.students, 1);
    assert_eq!(stats.parents, 1);
    assert_eq!(stats.teachers, 1);
    assert_eq!(stats.departments, 1);
    assert_eq!(stats.announcements, 2);

    let report = dashboards.admin_report().await?;
    assert_eq!(report.total_users, 6);
    assert!(report.active_by_role.contains(&(Role::Student, 1)));
    assert!(report.active_by_role.contains(&(Role::Admin, 1)));
    assert!(report.active_by_kind.contains(&(AnnouncementKind::Notice, 2)));
    Ok(())
}

#[tokio::test]
async fn test_teacher_without_department_has_no_students() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Art", "ART").await?;
    app.user("painter", Role::Student, Some(dept.id)).await?;
    let drifter = app.user("drift", Role::Teacher, None).await?;

    let dashboards = &app.state.service_context.dashboard_service;
    let dashboard = dashboards.teacher(&drifter).await?;
    assert!(dashboard.department.is_none());
    assert_eq!(dashboard.students_count, 0);
    assert!(dashboard.announcements.is_empty());
    assert!(dashboards.department_students(&drifter).await?.is_none());
    assert!(dashboards.department_attendance(&drifter).await?.is_none());

    let (cookie, _) = app.session_cookie(&drifter)?;
    let page = app
        .router()
        .oneshot(Request::builder().uri("/teacher/students").header(header::COOKIE, cookie).body(Body::empty())?)
        .await?;
    assert_eq!(page.status(), StatusCode::OK);
    let html = String::from_utf8(to_bytes(page.into_body(), usize::MAX).await?.to_vec())?;
    assert!(html.contains("You are not assigned to any department."));
    Ok(())
}

#[tokio::test]
async fn test_teacher_sees_own_five_latest_active_announcements() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Chemistry", "CHEM").await?;
    let admin = app.user("root", Role::Admin, None).await?;
    let teacher = app.user("curie", Role::Teacher, Some(dept.id)).await?;
    let colleague = app.user("lavoisier", Role::Teacher, Some(dept.id)).await?;
    app.user("s1", Role::Student, Some(dept.id)).await?;
    let dropped = app.user("s2", Role::Student, Some(dept.id)).await?;
    app.state.service_context.user_service.set_active(&admin, dropped.id, false).await?;

    let own = post_many(&app, &teacher, "Lab safety", 7).await?;
    post_many(&app, &colleague, "Other notice", 2).await?;
    let newest = own[6];
    app.state.service_context.announcement_service.delete(&teacher, newest).await?;

    let dashboard = app.state.service_context.dashboard_service.teacher(&teacher).await?;
    assert_eq!(dashboard.department.map(|d| d.id), Some(dept.id));
    assert_eq!(dashboard.students_count, 1);

    let shown: Vec<i64> = dashboard.announcements.iter().map(|a| a.id).collect();
    assert_eq!(shown, vec![own[5], own[4], own[3], own[2], own[1]]);
    assert!(dashboard.announcements.iter().all(|a| a.author_id == teacher.id && a.is_active));
    Ok(())
}

#[tokio::test]
async fn test_student_dashboard_caps_announcements_at_ten() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Biology", "BIO").await?;
    let teacher = app.user("darwin", Role::Teacher, Some(dept.id)).await?;
    let student = app.user("finch", Role::Student, Some(dept.id)).await?;

    let ids = post_many(&app, &teacher, "Field trip", 12).await?;
    app.state.service_context.announcement_service.delete(&teacher, ids[11]).await?;

    let dashboard = app.state.service_context.dashboard_service.student(&student).await?;
    assert_eq!(dashboard.student_id.as_deref(), Some("ID-finch"));
    assert_eq!(dashboard.attendance, Some(FIXED_SUMMARY));
    assert_eq!(dashboard.announcements.len(), 10);
    assert_eq!(dashboard.announcements[0].id, ids[10]);
    assert!(dashboard.announcements.iter().all(|a| a.is_active));
    Ok(())
}

#[tokio::test]
async fn test_parent_dashboard_depends_on_a_linked_student() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Drama", "DRA").await?;
    let teacher = app.user("shakes", Role::Teacher, Some(dept.id)).await?;
    post_many(&app, &teacher, "Rehearsal", 2).await?;

    let users = &app.state.service_context.user_service;
    let unlinked = app.user("lonely", Role::Parent, None).await?;
    let mut request = common::registration("mum", Role::Parent);
    request.parent_student_id = Some("ID-kid".to_string());
    let linked = users.create_user(request, None).await?;

    let dashboards = &app.state.service_context.dashboard_service;

    let empty = dashboards.parent(&unlinked).await?;
    assert!(empty.student_id.is_none());
    assert!(empty.attendance.is_none());
    assert!(empty.announcements.is_empty());

    let full = dashboards.parent(&linked).await?;
    assert_eq!(full.student_id.as_deref(), Some("ID-kid"));
    assert_eq!(full.attendance, Some(FIXED_SUMMARY));
    assert_eq!(full.announcements.len(), 2);

    let (cookie, _) = app.session_cookie(&unlinked)?;
    let page = app
        .router()
        .oneshot(Request::builder().uri("/parent/dashboard").header(header::COOKIE, cookie).body(Body::empty())?)
        .await?;
    assert_eq!(page.status(), StatusCode::OK);
    let html = String::from_utf8(to_bytes(page.into_body(), usize::MAX).await?.to_vec())?;
    assert!(html.contains("No student linked to your account. Please contact admin."));
    Ok(())
}

/// Answers every question after a fixed delay.
struct SlowAttendance(Duration);

#[async_trait]
impl attendance_portal::integrations::AttendanceSource for SlowAttendance {
    fn name(&self) -> &str {
        "slow"
    }

    async fn summary(&self, _student_id: &str) -> AttendanceSummary {
        tokio::time::sleep(self.0).await;
        FIXED_SUMMARY
    }

    async fn logs(&self, _student_id: &str) -> Vec<AttendanceEntry> {
        tokio::time::sleep(self.0).await;
        Vec::new()
    }
}

#[tokio::test]
async fn test_department_attendance_asks_the_gateway_concurrently() -> anyhow::Result<()> {
    let delay = Duration::from_millis(400);
    let app = common::test_app_with(Arc::new(SlowAttendance(delay)), |_| {}).await?;
    let dept = app.department("Economics", "ECON").await?;
    let teacher = app.user("keynes", Role::Teacher, Some(dept.id)).await?;
    for n in 1..=6 {
        app.user(&format!("econ{}", n), Role::Student, Some(dept.id)).await?;
    }

    let started = Instant::now();
    let rows = app
        .state
        .service_context
        .dashboard_service
        .department_attendance(&teacher)
        .await?
        .unwrap_or_default();
    let elapsed = started.elapsed();

    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|(_, summary)| *summary == Some(FIXED_SUMMARY)));
    assert!(elapsed < delay * 3, "took {:?}", elapsed);
    Ok(())
}
