use std::sync::Arc;

use crate::{
    auth::guards,
    domain::*,
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepository>) -> Self {
        Self { repo }
    }

    /// Teachers and admins post into their own department. A due date only
    /// survives on assignments.
    pub async fn create(&self, actor: &User, request: CreateAnnouncementRequest) -> Result<Announcement> {
        guards::ensure(actor.role, guards::is_teacher_or_admin)?;

        let department_id = actor.department_id.ok_or_else(|| {
            AppError::Validation(
                "You must be assigned to a department to create announcements.".to_string(),
            )
        })?;

        let due_date = match request.announcement_type {
            AnnouncementKind::Assignment => request.due_date,
            AnnouncementKind::Announcement | AnnouncementKind::Notice => None,
        };

        let created = self.repo.create(NewAnnouncement {
            title: request.title.trim().to_string(),
            content: request.content,
            announcement_type: request.announcement_type,
            department_id,
            author_id: actor.id,
            file: request.file,
            due_date,
        }).await?;

        tracing::info!(
            announcement_id = created.id,
            author_id = actor.id,
            kind = %created.announcement_type,
            "Created announcement"
        );
        Ok(created)
    }

    /// Direct lookup. Soft-deleted rows are still returned.
    pub async fn view(&self, id: i64) -> Result<Announcement> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    pub async fn list(&self, filter: KindFilter) -> Result<Vec<Announcement>> {
        self.repo.list_active(filter.kind(), None).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Announcement>> {
        self.repo.list_active(None, Some(limit)).await
    }

    /// Soft delete, allowed for the author and for admins. The row and any
    /// attachment stay in place.
    pub async fn delete(&self, actor: &User, id: i64) -> Result<()> {
        let author_scope = if guards::is_admin(actor.role) {
            None
        } else {
            Some(actor.id)
        };

        if self.repo.deactivate(id, author_scope).await? {
            tracing::info!(announcement_id = id, actor_id = actor.id, "Soft-deleted announcement");
            return Ok(());
        }

        match self.repo.find_by_id(id).await? {
            None => Err(AppError::NotFound("Announcement not found".to_string())),
            Some(_) => {
                tracing::warn!(announcement_id = id, actor_id = actor.id, "Delete refused");
                Err(AppError::Forbidden)
            }
        }
    }

    /// Whether `actor` may delete `announcement`; used to decide whether to offer it.
    pub fn can_delete(actor: &User, announcement: &Announcement) -> bool {
        guards::is_admin(actor.role) || announcement.author_id == actor.id
    }
}
