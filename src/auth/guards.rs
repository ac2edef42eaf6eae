//! Role predicates gating the role-scoped route groups.

use crate::{
    domain::Role,
    error::{AppError, Result},
};

pub type Guard = fn(Role) -> bool;

pub fn is_student(role: Role) -> bool {
    matches!(role, Role::Student)
}

pub fn is_parent(role: Role) -> bool {
    matches!(role, Role::Parent)
}

pub fn is_teacher_or_admin(role: Role) -> bool {
    matches!(role, Role::Teacher | Role::Admin)
}

pub fn is_admin(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// `Err(AppError::Forbidden)` unless `guard` admits `role`.
pub fn ensure(role: Role, guard: Guard) -> Result<()> {
    if guard(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
