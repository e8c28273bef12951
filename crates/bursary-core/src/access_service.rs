//! Actor lookup and permission enforcement.

use bursary_domain::{has_permission, Action, FeeBook, Role, User};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{time::Clock, CoreError};

/// Resolves actors and checks their role against the permission table.
pub struct AccessService;

impl AccessService {
    /// Looks up `actor_id` in `book` and confirms the role allows `action`.
    ///
    /// Roles are read from the book on every call; a role change takes effect on the
    /// very next operation.
    pub fn authorize(book: &FeeBook, actor_id: Uuid, action: Action) -> Result<User, CoreError> {
        let user = book
            .user(actor_id)
            .ok_or_else(|| CoreError::not_found("user", actor_id))?;
        if !user.can(action) {
            warn!(actor = %actor_id, role = %user.role, %action, "permission denied");
            return Err(CoreError::PermissionDenied {
                role: user.role,
                action,
            });
        }
        Ok(user.clone())
    }

    /// Creates the first super admin. Only allowed while the book has no users.
    pub fn bootstrap(
        book: &mut FeeBook,
        clock: &dyn Clock,
        display_name: &str,
    ) -> Result<User, CoreError> {
        if !book.users.is_empty() {
            return Err(CoreError::invalid_state(
                "user directory",
                "bootstrap",
                "already initialized",
            ));
        }
        let user = Self::new_user(clock, display_name, Role::SuperAdmin)?;
        book.users.push(user.clone());
        book.touch(clock.now());
        info!(user = %user.id, "bootstrapped super admin");
        Ok(user)
    }

    pub fn add_user(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        display_name: &str,
        role: Role,
    ) -> Result<User, CoreError> {
        Self::authorize(book, actor_id, Action::ManageUsers)?;
        let user = Self::new_user(clock, display_name, role)?;
        book.users.push(user.clone());
        book.touch(clock.now());
        info!(user = %user.id, %role, "user added");
        Ok(user)
    }

    pub fn assign_role(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<User, CoreError> {
        Self::authorize(book, actor_id, Action::ManageUsers)?;
        let current = book
            .user(user_id)
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        if current.role == Role::SuperAdmin && role != Role::SuperAdmin {
            Self::ensure_other_super_admin(book, user_id)?;
        }
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        user.role = role;
        let updated = user.clone();
        book.touch(clock.now());
        info!(user = %user_id, %role, "role assigned");
        Ok(updated)
    }

    pub fn set_active(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        user_id: Uuid,
        active: bool,
    ) -> Result<User, CoreError> {
        Self::authorize(book, actor_id, Action::ManageUsers)?;
        let current = book
            .user(user_id)
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        if !active && current.role == Role::SuperAdmin {
            Self::ensure_other_super_admin(book, user_id)?;
        }
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        user.is_active = active;
        let updated = user.clone();
        book.touch(clock.now());
        Ok(updated)
    }

    fn new_user(clock: &dyn Clock, display_name: &str, role: Role) -> Result<User, CoreError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("display name is required".into()));
        }
        Ok(User::new(name, role, clock.now()))
    }

    // The directory must always keep one active super admin.
    fn ensure_other_super_admin(book: &FeeBook, excluding: Uuid) -> Result<(), CoreError> {
        let others = book
            .users
            .iter()
            .any(|u| u.id != excluding && u.is_active && u.role == Role::SuperAdmin);
        if others {
            Ok(())
        } else {
            Err(CoreError::invalid_state(
                "user",
                excluding,
                "the last active super_admin",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SystemClock;

    #[test]
    fn bootstrap_only_runs_once() {
        let mut book = FeeBook::default();
        AccessService::bootstrap(&mut book, &SystemClock, "Principal").unwrap();
        let err = AccessService::bootstrap(&mut book, &SystemClock, "Again").unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[test]
    fn role_change_applies_to_next_authorization() {
        let mut book = FeeBook::default();
        let admin = AccessService::bootstrap(&mut book, &SystemClock, "Principal").unwrap();
        let clerk =
            AccessService::add_user(&mut book, &SystemClock, admin.id, "Clerk", Role::Staff)
                .unwrap();
        assert!(AccessService::authorize(&book, clerk.id, Action::ViewReports).is_err());

        AccessService::assign_role(&mut book, &SystemClock, admin.id, clerk.id, Role::Bursary)
            .unwrap();
        assert!(AccessService::authorize(&book, clerk.id, Action::ViewReports).is_ok());
    }

    #[test]
    fn last_super_admin_cannot_be_demoted() {
        let mut book = FeeBook::default();
        let admin = AccessService::bootstrap(&mut book, &SystemClock, "Principal").unwrap();
        let err =
            AccessService::assign_role(&mut book, &SystemClock, admin.id, admin.id, Role::Staff)
                .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[test]
    fn unknown_actor_is_not_found() {
        let book = FeeBook::default();
        let err = AccessService::authorize(&book, Uuid::new_v4(), Action::RecordPayment)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "user", .. }));
    }
}
