use std::sync::Arc;

use futures_util::future::join_all;

use crate::{
    domain::*,
    error::Result,
    integrations::AttendanceSource,
    repository::{AnnouncementRepository, DepartmentRepository, UserRepository},
};

const STUDENT_RECENT_ANNOUNCEMENTS: i64 = 10;
const TEACHER_RECENT_ANNOUNCEMENTS: i64 = 5;
const ADMIN_RECENT_USERS: i64 = 5;

pub struct StudentDashboard {
    pub student_id: Option<String>,
    pub attendance: Option<AttendanceSummary>,
    pub announcements: Vec<Announcement>,
}

pub struct ParentDashboard {
    pub student_id: Option<String>,
    pub attendance: Option<AttendanceSummary>,
    pub announcements: Vec<Announcement>,
}

/// Summary plus day-by-day log for one student.
pub struct AttendanceDetail {
    pub student_id: Option<String>,
    pub summary: Option<AttendanceSummary>,
    pub logs: Vec<AttendanceEntry>,
}

pub struct TeacherDashboard {
    pub department: Option<Department>,
    pub students_count: i64,
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStats {
    pub total_users: i64,
    pub students: i64,
    pub parents: i64,
    pub teachers: i64,
    pub departments: i64,
    pub announcements: i64,
}

pub struct AdminDashboard {
    pub stats: AdminStats,
    pub recent_users: Vec<User>,
}

pub struct AdminReport {
    pub total_users: i64,
    pub active_by_role: Vec<(Role, i64)>,
    pub active_by_kind: Vec<(AnnouncementKind, i64)>,
    pub departments: i64,
}

/// Gathers the per-role view data. Holds no rules of its own.
pub struct DashboardService {
    user_repo: Arc<dyn UserRepository>,
    department_repo: Arc<dyn DepartmentRepository>,
    announcement_repo: Arc<dyn AnnouncementRepository>,
    attendance: Arc<dyn AttendanceSource>,
}

impl DashboardService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        department_repo: Arc<dyn DepartmentRepository>,
        announcement_repo: Arc<dyn AnnouncementRepository>,
        attendance: Arc<dyn AttendanceSource>,
    ) -> Self {
        Self {
            user_repo,
            department_repo,
            announcement_repo,
            attendance,
        }
    }

    pub async fn student(&self, actor: &User) -> Result<StudentDashboard> {
        let student_id = actor.student_id.clone();
        let attendance = match &student_id {
            Some(id) => Some(self.attendance.summary(id).await),
            None => None,
        };
        let announcements = self
            .announcement_repo
            .list_active(None, Some(STUDENT_RECENT_ANNOUNCEMENTS))
            .await?;

        Ok(StudentDashboard {
            student_id,
            attendance,
            announcements,
        })
    }

    /// A parent without a linked student sees neither attendance nor announcements.
    pub async fn parent(&self, actor: &User) -> Result<ParentDashboard> {
        let Some(student_id) = actor.parent_student_id.clone() else {
            return Ok(ParentDashboard {
                student_id: None,
                attendance: None,
                announcements: Vec::new(),
            });
        };

        let attendance = self.attendance.summary(&student_id).await;
        let announcements = self
            .announcement_repo
            .list_active(None, Some(STUDENT_RECENT_ANNOUNCEMENTS))
            .await?;

        Ok(ParentDashboard {
            student_id: Some(student_id),
            attendance: Some(attendance),
            announcements,
        })
    }

    /// Attendance detail for the student an account speaks for: its own
    /// `student_id` for students, the linked one for parents.
    pub async fn attendance_detail(&self, student_id: Option<&str>) -> AttendanceDetail {
        match student_id {
            Some(id) => AttendanceDetail {
                student_id: Some(id.to_string()),
                summary: Some(self.attendance.summary(id).await),
                logs: self.attendance.logs(id).await,
            },
            None => AttendanceDetail {
                student_id: None,
                summary: None,
                logs: Vec::new(),
            },
        }
    }

    pub async fn teacher(&self, actor: &User) -> Result<TeacherDashboard> {
        let department = match actor.department_id {
            Some(id) => self.department_repo.find_by_id(id).await?,
            None => None,
        };
        let students_count = match &department {
            Some(d) => self.user_repo.count_active_students_in_department(d.id).await?,
            None => 0,
        };
        let announcements = self
            .announcement_repo
            .list_active_by_author(actor.id, TEACHER_RECENT_ANNOUNCEMENTS)
            .await?;

        Ok(TeacherDashboard {
            department,
            students_count,
            announcements,
        })
    }

    /// `None` when the teacher has no department.
    pub async fn department_students(&self, actor: &User) -> Result<Option<Vec<User>>> {
        match actor.department_id {
            Some(id) => Ok(Some(self.user_repo.list_active_students_in_department(id).await?)),
            None => Ok(None),
        }
    }

    /// Each active student of the teacher's department with their attendance.
    /// The gateway is asked for every student that has an identifier, all at
    /// once, so the page waits for the slowest answer rather than their sum.
    pub async fn department_attendance(
        &self,
        actor: &User,
    ) -> Result<Option<Vec<(User, Option<AttendanceSummary>)>>> {
        let Some(students) = self.department_students(actor).await? else {
            return Ok(None);
        };

        let rows = join_all(students.into_iter().map(|student| async move {
            let summary = match &student.student_id {
                Some(id) => Some(self.attendance.summary(id).await),
                None => None,
            };
            (student, summary)
        }))
        .await;
        Ok(Some(rows))
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        Ok(AdminStats {
            total_users: self.user_repo.count().await?,
            students: self.user_repo.count_active_by_role(Role::Student).await?,
            parents: self.user_repo.count_active_by_role(Role::Parent).await?,
            teachers: self.user_repo.count_active_by_role(Role::Teacher).await?,
            departments: self.department_repo.count().await?,
            announcements: self.announcement_repo.count_active().await?,
        })
    }

    pub async fn admin(&self) -> Result<AdminDashboard> {
        Ok(AdminDashboard {
            stats: self.admin_stats().await?,
            recent_users: self.user_repo.list_recent(ADMIN_RECENT_USERS).await?,
        })
    }

    pub async fn admin_report(&self) -> Result<AdminReport> {
        let mut active_by_role = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            active_by_role.push((role, self.user_repo.count_active_by_role(role).await?));
        }

        let mut active_by_kind = Vec::with_capacity(AnnouncementKind::ALL.len());
        for kind in AnnouncementKind::ALL {
            active_by_kind.push((kind, self.announcement_repo.count_active_by_kind(kind).await?));
        }

        Ok(AdminReport {
            total_users: self.user_repo.count().await?,
            active_by_role,
            active_by_kind,
            departments: self.department_repo.count().await?,
        })
    }
}
