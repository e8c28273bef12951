//! Roles, actions and the role-to-action permission table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Bursary,
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::SuperAdmin => "super_admin",
            Role::Bursary => "bursary",
            Role::Staff => "staff",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Every capability gated by the permission table.
pub enum Action {
    RecordPayment,
    ApprovePayment,
    /// Edit or void a recorded payment.
    AmendPayment,
    ProposeFeeChange,
    ApproveFeeChange,
    EditFeeSchedule,
    PromoteStudents,
    ManageStudents,
    ManageSessions,
    ManageUsers,
    ViewReports,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::RecordPayment,
        Action::ApprovePayment,
        Action::AmendPayment,
        Action::ProposeFeeChange,
        Action::ApproveFeeChange,
        Action::EditFeeSchedule,
        Action::PromoteStudents,
        Action::ManageStudents,
        Action::ManageSessions,
        Action::ManageUsers,
        Action::ViewReports,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::RecordPayment => "record_payment",
            Action::ApprovePayment => "approve_payment",
            Action::AmendPayment => "amend_payment",
            Action::ProposeFeeChange => "propose_fee_change",
            Action::ApproveFeeChange => "approve_fee_change",
            Action::EditFeeSchedule => "edit_fee_schedule",
            Action::PromoteStudents => "promote_students",
            Action::ManageStudents => "manage_students",
            Action::ManageSessions => "manage_sessions",
            Action::ManageUsers => "manage_users",
            Action::ViewReports => "view_reports",
        };
        f.write_str(label)
    }
}

/// Total mapping of role to permitted actions.
pub fn has_permission(role: Role, action: Action) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Bursary => matches!(
            action,
            Action::RecordPayment
                | Action::ProposeFeeChange
                | Action::ManageStudents
                | Action::ViewReports
        ),
        Role::Staff => matches!(action, Action::RecordPayment | Action::ManageStudents),
    }
}

impl Role {
    /// Actions this role may perform, in declaration order.
    pub fn permissions(self) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|action| has_permission(self, *action))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// An actor who can operate the system.
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    #[serde(default = "User::default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(display_name: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            role,
            is_active: true,
            created_at: now,
        }
    }

    pub fn default_active() -> bool {
        true
    }

    pub fn can(&self, action: Action) -> bool {
        self.is_active && has_permission(self.role, action)
    }
}

impl Identifiable for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for User {
    fn display_label(&self) -> String {
        format!("{} ({})", self.display_name, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_super_admin_holds_privileged_actions() {
        for action in [
            Action::ApprovePayment,
            Action::AmendPayment,
            Action::ApproveFeeChange,
            Action::EditFeeSchedule,
            Action::PromoteStudents,
            Action::ManageUsers,
        ] {
            assert!(has_permission(Role::SuperAdmin, action));
            assert!(!has_permission(Role::Bursary, action));
            assert!(!has_permission(Role::Staff, action));
        }
    }

    #[test]
    fn bursary_may_propose_but_staff_may_not() {
        assert!(has_permission(Role::Bursary, Action::ProposeFeeChange));
        assert!(!has_permission(Role::Staff, Action::ProposeFeeChange));
        assert!(Role::Staff.permissions().contains(&Action::RecordPayment));
    }

    #[test]
    fn inactive_users_cannot_act() {
        let mut user = User::new("Ada", Role::SuperAdmin, Utc::now());
        assert!(user.can(Action::ManageUsers));
        user.is_active = false;
        assert!(!user.can(Action::ManageUsers));
    }
}
