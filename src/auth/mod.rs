use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::Duration;
use cookie::{Cookie, SameSite};

use crate::{
    config::AuthConfig,
    domain::User,
    error::{AppError, Result},
    repository::UserRepository,
};

pub mod csrf;
pub mod guards;
pub mod session;

pub use csrf::CsrfService;
use session::{SessionClaims, SessionCodec};

pub const SESSION_COOKIE: &str = "session";

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    sessions: SessionCodec,
    csrf: CsrfService,
    session_duration: Duration,
    remember_me_duration: Duration,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            user_repo,
            sessions: SessionCodec::new(&config.secret_key),
            csrf: CsrfService::new(&config.secret_key)?,
            session_duration: Duration::hours(config.session_duration_hours),
            remember_me_duration: Duration::days(config.remember_me_days),
        })
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    /// Hash a password using Argon2 with a fresh random salt.
    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Checks credentials. Unknown usernames, wrong passwords and inactive accounts
    /// all yield `AppError::InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let Some((user, password_hash)) = self.user_repo.find_credentials(username).await? else {
            tracing::info!("Login failed for unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if !Self::verify_password(password, &password_hash).await? {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!(user_id = user.id, "Login failed: account inactive");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok(user)
    }

    pub fn issue_session(&self, user: &User, remember_me: bool) -> Result<(SessionClaims, String)> {
        self.sessions.issue(user, self.session_lifetime(remember_me))
    }

    pub fn validate_session(&self, token: &str) -> Option<SessionClaims> {
        self.sessions.verify(token)
    }

    pub fn csrf_token(&self, session_token: &str) -> String {
        self.csrf.generate_token(session_token)
    }

    pub fn verify_csrf(&self, session_token: &str, candidate: &str) -> bool {
        self.csrf.validate_token(session_token, candidate)
    }

    pub fn create_session_cookie(&self, token: &str, remember_me: bool, secure: bool) -> Cookie<'static> {
        let max_age = cookie::time::Duration::seconds(self.session_lifetime(remember_me).num_seconds());

        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .max_age(max_age)
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }

    fn session_lifetime(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.remember_me_duration
        } else {
            self.session_duration
        }
    }
}

/// Only same-site absolute paths are honoured as post-login targets.
/// Browsers drop tabs and newlines from URLs, so any control or whitespace
/// character disqualifies the path.
pub fn safe_next_path(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|p| {
        p.starts_with('/')
            && !p.starts_with("//")
            && !p.contains('\\')
            && !p.chars().any(|c| c.is_control() || c.is_whitespace())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_paths_are_accepted_as_next() {
        assert_eq!(safe_next_path(Some("/announcements/list")), Some("/announcements/list"));
        assert_eq!(safe_next_path(Some("//evil.example")), None);
        assert_eq!(safe_next_path(Some("https://evil.example")), None);
        assert_eq!(safe_next_path(Some("/\\evil.example")), None);
        assert_eq!(safe_next_path(None), None);
    }

    #[test]
    fn next_with_control_characters_is_rejected() {
        assert_eq!(safe_next_path(Some("/\t/evil.example")), None);
        assert_eq!(safe_next_path(Some("/\n/evil.example")), None);
        assert_eq!(safe_next_path(Some("/\r\nSet-Cookie: x=1")), None);
        assert_eq!(safe_next_path(Some("/teacher/students?q=a b")), None);
    }

    #[tokio::test]
    async fn password_hash_verifies_only_the_original() {
        let hash = AuthService::hash_password("hunter22").await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(AuthService::verify_password("hunter22", &hash).await.unwrap());
        assert!(!AuthService::verify_password("hunter23", &hash).await.unwrap());
    }
}
