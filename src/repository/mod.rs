use async_trait::async_trait;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod department_repository;
pub mod announcement_repository;

pub use user_repository::SqliteUserRepository;
pub use department_repository::SqliteDepartmentRepository;
pub use announcement_repository::SqliteAnnouncementRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user. Duplicate username, email or student id surface as
    /// `AppError::Validation` straight from the unique indexes.
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// The user together with their stored password hash.
    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<User>>;
    async fn list_active_students_in_department(&self, department_id: i64) -> Result<Vec<User>>;
    async fn count(&self) -> Result<i64>;
    async fn count_active_by_role(&self, role: Role) -> Result<i64>;
    async fn count_active_students_in_department(&self, department_id: i64) -> Result<i64>;
    async fn set_department(&self, id: i64, department_id: Option<i64>) -> Result<User>;
    async fn set_active(&self, id: i64, is_active: bool) -> Result<User>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn create(&self, department: NewDepartment) -> Result<Department>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>>;
    async fn list(&self) -> Result<Vec<Department>>;
    async fn count(&self) -> Result<i64>;
    /// Removes the department and, through the foreign key, its announcements.
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    /// Looks the row up regardless of its active flag.
    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>>;
    /// Active rows only, newest first.
    async fn list_active(&self, kind: Option<AnnouncementKind>, limit: Option<i64>) -> Result<Vec<Announcement>>;
    async fn list_active_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<Announcement>>;
    async fn count_active(&self) -> Result<i64>;
    async fn count_active_by_kind(&self, kind: AnnouncementKind) -> Result<i64>;
    /// Flips the active flag off in one statement. With `author_id` set, only a row
    /// written by that author is touched. Returns whether a row matched.
    async fn deactivate(&self, id: i64, author_id: Option<i64>) -> Result<bool>;
}
