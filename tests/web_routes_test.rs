mod common;

use attendance_portal::domain::{AnnouncementKind, CreateAnnouncementRequest, KindFilter, Role};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

async fn body_text(response: Response) -> anyhow::Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn get(uri: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

fn post_form(uri: &str, cookie: Option<&str>, body: String) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::from(body))?)
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

/// Multipart `POST /announcements/create` with text fields and an optional file.
fn create_request(cookie: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> anyhow::Result<Request<Body>> {
    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok(Request::builder()
        .method("POST")
        .uri("/announcements/create")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))?)
}

#[tokio::test]
async fn test_public_pages_and_health() -> anyhow::Result<()> {
    let app = common::test_app().await?;

    let home = app.router().oneshot(get("/", None)?).await?;
    assert_eq!(home.status(), StatusCode::OK);
    assert!(body_text(home).await?.contains("Attendance Portal"));

    let health = app.router().oneshot(get("/health", None)?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(health).await?)?;
    assert_eq!(json["database"], "ok");
    assert_eq!(json["attendance_source"], "fixed");
    Ok(())
}

#[tokio::test]
async fn test_anonymous_visitors_are_sent_to_login() -> anyhow::Result<()> {
    let app = common::test_app().await?;

    let response = app.router().oneshot(get("/student/dashboard", None)?).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?next=%2Fstudent%2Fdashboard"));

    // A forged cookie is no better than none.
    let response = app
        .router()
        .oneshot(get("/admin/dashboard", Some("session=not-a-token"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn test_role_guards_deny_other_roles() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let student = app.user("stu", Role::Student, None).await?;
    let (cookie, _) = app.session_cookie(&student)?;

    let own = app.router().oneshot(get("/student/dashboard", Some(&cookie))?).await?;
    assert_eq!(own.status(), StatusCode::OK);
    let page = body_text(own).await?;
    assert!(page.contains("92.5"));

    for uri in ["/admin/dashboard", "/teacher/dashboard", "/parent/dashboard", "/announcements/create"] {
        let response = app.router().oneshot(get(uri, Some(&cookie))?).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert!(body_text(response).await?.contains("Access denied"));
    }

    let redirect = app.router().oneshot(get("/dashboard", Some(&cookie))?).await?;
    assert_eq!(location(&redirect), Some("/student/dashboard"));
    Ok(())
}

#[tokio::test]
async fn test_login_sets_cookie_and_redirects_to_role_dashboard() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    app.user("tea", Role::Teacher, None).await?;

    let response = app
        .router()
        .oneshot(post_form("/login", None, "username=tea&password=secret123".to_string())?)
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/teacher/dashboard"));
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let response = app
        .router()
        .oneshot(post_form(
            "/login",
            None,
            "username=tea&password=secret123&next=%2Fannouncements%2Flist".to_string(),
        )?)
        .await?;
    assert_eq!(location(&response), Some("/announcements/list"));

    let response = app
        .router()
        .oneshot(post_form("/login", None, "username=tea&password=wrong".to_string())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await?.contains("Invalid username or password"));
    Ok(())
}

#[tokio::test]
async fn test_login_ignores_next_with_control_characters() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    app.user("stu", Role::Student, None).await?;

    for next in ["%2F%0Aabc", "%2F%09%2Fevil.example", "%2F%0D%0Aabc"] {
        let response = app
            .router()
            .oneshot(post_form(
                "/login",
                None,
                format!("username=stu&password=secret123&next={}", next),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/student/dashboard"));
    }
    Ok(())
}

#[tokio::test]
async fn test_registration_form_reports_errors_inline() -> anyhow::Result<()> {
    let app = common::test_app().await?;

    let response = app
        .router()
        .oneshot(post_form(
            "/register",
            None,
            "username=al&email=bad&full_name=Al&password=secret1&password2=secret2&role=admin".to_string(),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = body_text(response).await?;
    assert!(page.contains("Username must be between 3 and 64 characters."));
    assert!(page.contains("Passwords must match."));
    assert!(page.contains("Invalid role selected."));

    let response = app
        .router()
        .oneshot(post_form(
            "/register",
            None,
            "username=alice&email=alice%40x.com&full_name=Alice&password=secret1&password2=secret1&role=student&student_id=S1&parent_student_id=".to_string(),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?registered=1"));
    Ok(())
}

#[tokio::test]
async fn test_delete_requires_csrf_token() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Music", "MUS").await?;
    let teacher = app.user("mozart", Role::Teacher, Some(dept.id)).await?;
    let service = &app.state.service_context.announcement_service;
    let posted = service
        .create(&teacher, CreateAnnouncementRequest {
            title: "Choir practice".to_string(),
            content: "Thursday after school in the hall.".to_string(),
            announcement_type: AnnouncementKind::Notice,
            due_date: None,
            file: None,
        })
        .await?;
    let (cookie, csrf) = app.session_cookie(&teacher)?;
    let uri = format!("/announcements/delete/{}", posted.id);

    let forged = app
        .router()
        .oneshot(post_form(&uri, Some(&cookie), "csrf_token=deadbeef".to_string())?)
        .await?;
    assert_eq!(forged.status(), StatusCode::FORBIDDEN);
    assert_eq!(service.list(KindFilter::All).await?.len(), 1);

    let accepted = app
        .router()
        .oneshot(post_form(&uri, Some(&cookie), format!("csrf_token={}", csrf))?)
        .await?;
    assert_eq!(accepted.status(), StatusCode::SEE_OTHER);
    assert!(service.list(KindFilter::All).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_multipart_create_stores_the_attachment() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let dept = app.department("Geography", "GEO").await?;
    let teacher = app.user("gerry", Role::Teacher, Some(dept.id)).await?;
    let (cookie, csrf) = app.session_cookie(&teacher)?;

    let request = create_request(
        &cookie,
        &[
            ("csrf_token", csrf.as_str()),
            ("title", "Map project"),
            ("content", "Draw a map of the school grounds."),
            ("announcement_type", "assignment"),
            ("due_date", "2024-05-01T10:00"),
        ],
        Some(("brief.txt", &b"map brief"[..])),
    )?;

    let response = app.router().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let created = app
        .state
        .service_context
        .announcement_service
        .list(KindFilter::All)
        .await?;
    assert_eq!(created.len(), 1);
    let announcement = &created[0];
    assert_eq!(location(&response).map(str::to_string), Some(format!("/announcements/view/{}", announcement.id)));
    assert_eq!(announcement.file_name.as_deref(), Some("brief.txt"));
    assert!(announcement.due_date.is_some());

    let stored = announcement.file_path.as_deref().unwrap_or_default();
    let on_disk = std::fs::read(app.uploads.path().join(stored))?;
    assert_eq!(on_disk, b"map brief");

    let served = app.router().oneshot(get(&format!("/uploads/{}", stored), None)?).await?;
    assert_eq!(served.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_padded_fields_are_validated_after_trimming() -> anyhow::Result<()> {
    let app = common::test_app().await?;

    let response = app
        .router()
        .oneshot(post_form(
            "/register",
            None,
            "username=++ab++&email=ab%40x.com&full_name=Ab+Cd&password=secret1&password2=secret1&role=student".to_string(),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await?.contains("Username must be between 3 and 64 characters."));

    let dept = app.department("Latin", "LAT").await?;
    let teacher = app.user("cicero", Role::Teacher, Some(dept.id)).await?;
    let (cookie, csrf) = app.session_cookie(&teacher)?;
    let response = app
        .router()
        .oneshot(create_request(
            &cookie,
            &[
                ("csrf_token", csrf.as_str()),
                ("title", "   abc   "),
                ("content", "Long enough content here."),
                ("announcement_type", "notice"),
            ],
            None,
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await?.contains("Title must be between 5 and 200 characters."));
    assert!(app
        .state
        .service_context
        .announcement_service
        .list(KindFilter::All)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_reported_on_the_form() -> anyhow::Result<()> {
    let app = common::test_app_with(std::sync::Arc::new(common::FixedAttendance), |settings| {
        settings.uploads.max_bytes = 1024 * 1024;
    })
    .await?;
    let dept = app.department("Astronomy", "ASTRO").await?;
    let teacher = app.user("kepler", Role::Teacher, Some(dept.id)).await?;
    let (cookie, csrf) = app.session_cookie(&teacher)?;

    // Past the upload ceiling plus the room left for the text fields.
    let huge = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .router()
        .oneshot(create_request(
            &cookie,
            &[
                ("csrf_token", csrf.as_str()),
                ("title", "Star chart"),
                ("content", "Plot the winter constellations."),
                ("announcement_type", "assignment"),
            ],
            Some(("chart.txt", huge.as_slice())),
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = body_text(response).await?;
    assert!(page.contains("File too large (max 1 MB)"));
    assert!(page.contains("Star chart"));
    assert!(std::fs::read_dir(app.uploads.path())?.next().is_none());
    Ok(())
}
