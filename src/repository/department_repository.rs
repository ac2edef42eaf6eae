use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::{Department, NewDepartment},
    error::{unique_violation_column, AppError, Result},
    repository::DepartmentRepository,
};

#[derive(FromRow)]
struct DepartmentRow {
    id: i64,
    name: String,
    code: String,
    description: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteDepartmentRepository {
    pool: SqlitePool,
}

impl SqliteDepartmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_department(row: DepartmentRow) -> Department {
        Department {
            id: row.id,
            name: row.name,
            code: row.code,
            description: row.description,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        }
    }
}

#[async_trait]
impl DepartmentRepository for SqliteDepartmentRepository {
    async fn create(&self, department: NewDepartment) -> Result<Department> {
        let now = Utc::now().naive_utc();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO departments (name, code, description, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#
        )
        .bind(&department.name)
        .bind(&department.code)
        .bind(&department.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation_column(&e).as_deref() {
            Some("departments.name") => {
                AppError::Validation("A department with that name already exists.".to_string())
            }
            Some("departments.code") => {
                AppError::Validation("A department with that code already exists.".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created department".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, code, description, created_at FROM departments WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::row_to_department))
    }

    async fn list(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, code, description, created_at FROM departments ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_department).collect())
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
