use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::{Announcement, AnnouncementKind, NewAnnouncement},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, announcement_type, department_id, author_id, \
                                    file_path, file_name, due_date, is_active, created_at, updated_at";

#[derive(FromRow)]
struct AnnouncementRow {
    id: i64,
    title: String,
    content: String,
    announcement_type: String,
    department_id: i64,
    author_id: i64,
    file_path: Option<String>,
    file_name: Option<String>,
    due_date: Option<NaiveDateTime>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: row.id,
            title: row.title,
            content: row.content,
            announcement_type: row
                .announcement_type
                .parse::<AnnouncementKind>()
                .map_err(AppError::Database)?,
            department_id: row.department_id,
            author_id: row.author_id,
            file_path: row.file_path,
            file_name: row.file_name,
            due_date: row.due_date,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        let now = Utc::now().naive_utc();
        let (file_path, file_name) = match &announcement.file {
            Some(file) => (Some(file.path.as_str()), Some(file.original_name.as_str())),
            None => (None, None),
        };

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO announcements (
                title, content, announcement_type, department_id, author_id,
                file_path, file_name, due_date, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING id
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.announcement_type.as_str())
        .bind(announcement.department_id)
        .bind(announcement.author_id)
        .bind(file_path)
        .bind(file_name)
        .bind(announcement.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        let sql = format!("SELECT {} FROM announcements WHERE id = ?", ANNOUNCEMENT_COLUMNS);
        let row = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None)
        }
    }

    async fn list_active(&self, kind: Option<AnnouncementKind>, limit: Option<i64>) -> Result<Vec<Announcement>> {
        // A negative LIMIT means "no limit" to SQLite.
        let sql = format!(
            "SELECT {} FROM announcements \
             WHERE is_active = 1 AND (? IS NULL OR announcement_type = ?) \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?",
            ANNOUNCEMENT_COLUMNS
        );
        let kind_str = kind.map(|k| k.as_str());

        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(kind_str)
            .bind(kind_str)
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn list_active_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Announcement>> {
        let sql = format!(
            "SELECT {} FROM announcements \
             WHERE author_id = ? AND is_active = 1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?",
            ANNOUNCEMENT_COLUMNS
        );

        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(author_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn count_active(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM announcements WHERE is_active = 1"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_active_by_kind(&self, kind: AnnouncementKind) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM announcements WHERE is_active = 1 AND announcement_type = ?"
        )
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn deactivate(&self, id: i64, author_id: Option<i64>) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET is_active = 0, updated_at = ?
            WHERE id = ? AND (? IS NULL OR author_id = ?)
            "#
        )
        .bind(now)
        .bind(id)
        .bind(author_id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
