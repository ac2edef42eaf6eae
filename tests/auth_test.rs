mod common;

use attendance_portal::{domain::Role, error::AppError};

#[tokio::test]
async fn test_login_session_carries_the_stored_role() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let auth = &app.state.service_context.auth_service;

    for (name, role) in [("st", Role::Student), ("pa", Role::Parent), ("te", Role::Teacher), ("ad", Role::Admin)] {
        app.user(name, role, None).await?;

        let user = auth.login(name, "secret123").await?;
        let (_, token) = auth.issue_session(&user, false)?;
        let claims = auth.validate_session(&token).expect("valid token");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, role);
        assert_eq!(user.role.dashboard_path(), format!("/{}/dashboard", role));
    }
    Ok(())
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let ctx = &app.state.service_context;
    let admin = app.user("root", Role::Admin, None).await?;
    let user = app.user("carol", Role::Student, None).await?;

    let unknown = ctx.auth_service.login("nobody", "secret123").await.unwrap_err();
    let wrong = ctx.auth_service.login("carol", "nope-nope").await.unwrap_err();

    ctx.user_service.set_active(&admin, user.id, false).await?;
    let inactive = ctx.auth_service.login("carol", "secret123").await.unwrap_err();

    for err in [unknown, wrong, inactive] {
        assert!(matches!(err, AppError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid username or password");
    }
    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_deactivate_themselves() -> anyhow::Result<()> {
    let app = common::test_app().await?;
    let admin = app.user("root", Role::Admin, None).await?;

    let err = app
        .state
        .service_context
        .user_service
        .set_active(&admin, admin.id, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}
