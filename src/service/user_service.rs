use std::sync::Arc;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    repository::{DepartmentRepository, UserRepository},
};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    department_repo: Arc<dyn DepartmentRepository>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        department_repo: Arc<dyn DepartmentRepository>,
    ) -> Self {
        Self { repo, department_repo }
    }

    /// Public self-registration. Admin accounts cannot be created this way.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        if !request.role.is_self_registrable() {
            return Err(AppError::Validation("Invalid role selected.".to_string()));
        }
        self.create_user(request, None).await
    }

    /// Creates an account of any role. Uniqueness of username, email and student id
    /// is left to the database, so concurrent duplicates cannot both succeed.
    pub async fn create_user(&self, request: RegisterRequest, department_id: Option<i64>) -> Result<User> {
        let password_hash = AuthService::hash_password(&request.password).await?;

        // Identifier fields only make sense for their own role.
        let student_id = match request.role {
            Role::Student => non_blank(request.student_id),
            _ => None,
        };
        let parent_student_id = match request.role {
            Role::Parent => non_blank(request.parent_student_id),
            _ => None,
        };

        let user = self.repo.create(NewUser {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            password_hash,
            role: request.role,
            student_id,
            parent_student_id,
            department_id,
        }).await?;

        tracing::info!(user_id = user.id, role = %user.role, "Registered user {}", user.username);
        Ok(user)
    }

    pub async fn create_department(&self, department: NewDepartment) -> Result<Department> {
        let department = NewDepartment {
            name: department.name.trim().to_string(),
            code: department.code.trim().to_uppercase(),
            description: non_blank(department.description),
        };
        let created = self.department_repo.create(department).await?;
        tracing::info!(department_id = created.id, "Created department {}", created.code);
        Ok(created)
    }

    pub async fn assign_department(&self, user_id: i64, department_id: Option<i64>) -> Result<User> {
        if let Some(id) = department_id {
            self.department_repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;
        }
        self.repo.set_department(user_id, department_id).await
    }

    /// Admins cannot deactivate themselves and lock everyone out.
    pub async fn set_active(&self, actor: &User, user_id: i64, is_active: bool) -> Result<User> {
        if actor.id == user_id && !is_active {
            return Err(AppError::BadRequest("You cannot deactivate your own account.".to_string()));
        }
        let user = self.repo.set_active(user_id, is_active).await?;
        tracing::info!(user_id, is_active, actor_id = actor.id, "Changed account status");
        Ok(user)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
