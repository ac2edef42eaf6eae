use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::{NewUser, Role, User},
    error::{unique_violation_column, AppError, Result},
    repository::UserRepository,
};

const USER_COLUMNS: &str = "id, username, email, full_name, role, student_id, parent_student_id, \
                            department_id, is_active, created_at";

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    role: String,
    student_id: Option<String>,
    parent_student_id: Option<String>,
    department_id: Option<i64>,
    is_active: i32,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            role: row.role.parse::<Role>().map_err(AppError::Database)?,
            student_id: row.student_id,
            parent_student_id: row.parent_student_id,
            department_id: row.department_id,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn map_insert_error(err: sqlx::Error) -> AppError {
        match unique_violation_column(&err).as_deref() {
            Some("users.username") => AppError::Validation(
                "Username already exists. Please choose a different one.".to_string(),
            ),
            Some("users.email") => AppError::Validation(
                "Email already registered. Please use a different one.".to_string(),
            ),
            Some("users.student_id") => {
                AppError::Validation("Student ID already registered.".to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let now = Utc::now().naive_utc();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (
                username, email, password_hash, full_name, role,
                student_id, parent_student_id, department_id, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            RETURNING id
            "#
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(&user.student_id)
        .bind(&user.parent_student_id)
        .bind(user.department_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created user".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_by("email", email).await
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE username = ?",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some((Self::row_to_user(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_user)
            .collect()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT ?",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_user)
            .collect()
    }

    async fn list_active_students_in_department(&self, department_id: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users \
             WHERE department_id = ? AND role = ? AND is_active = 1 \
             ORDER BY full_name",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(department_id)
            .bind(Role::Student.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_user)
            .collect()
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_active_by_role(&self, role: Role) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = ? AND is_active = 1"
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_active_students_in_department(&self, department_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE department_id = ? AND role = ? AND is_active = 1"
        )
        .bind(department_id)
        .bind(Role::Student.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn set_department(&self, id: i64, department_id: Option<i64>) -> Result<User> {
        let result = sqlx::query("UPDATE users SET department_id = ? WHERE id = ?")
            .bind(department_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated user".to_string())
        })
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<User> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(if is_active { 1i32 } else { 0i32 })
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated user".to_string())
        })
    }
}
