//! Declarative role table.
//!
//! The table answers one question: may a principal with role `R` attempt
//! action `A` on a resource of kind `K` at all? Ownership, tenant and
//! enrollment rules are applied afterwards by the
//! [`PolicyEvaluator`](crate::policy::PolicyEvaluator); a role that is not
//! listed here is denied before any of those rules are consulted.
//!
//! Same-school read visibility is configured per kind instead of being a
//! single global rule. It is enabled for the project domain (projects,
//! milestones, teams, team members) and disabled for assessments and
//! submissions.

use crate::types::{Action, ResourceKind, Role};

/// Role permissions for a single resource kind.
#[derive(Debug, Clone, Copy)]
pub struct KindPolicy {
    pub kind: ResourceKind,
    /// Actions a teacher may attempt.
    pub teacher: &'static [Action],
    /// Actions a student may attempt.
    pub student: &'static [Action],
    /// Whether a non-owning teacher from the same school may read.
    pub school_scope_read: bool,
}

/// Every resource-scoped action. Admin rows use this list; a free admin is
/// looked up under the teacher column instead.
const RESOURCE_ACTIONS: &[Action] = &[
    Action::Read,
    Action::Create,
    Action::Update,
    Action::Delete,
    Action::ToggleVisibility,
    Action::Submit,
    Action::ManageTeam,
    Action::ViewAnalytics,
];

pub const DEFAULT_TABLE: &[KindPolicy] = &[
    KindPolicy {
        kind: ResourceKind::Project,
        teacher: &[
            Action::Read,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::ToggleVisibility,
            Action::ManageTeam,
            Action::ViewAnalytics,
        ],
        student: &[Action::Read],
        school_scope_read: true,
    },
    KindPolicy {
        kind: ResourceKind::Milestone,
        teacher: &[Action::Read, Action::Create, Action::Update, Action::Delete],
        student: &[Action::Read],
        school_scope_read: true,
    },
    KindPolicy {
        kind: ResourceKind::Assessment,
        teacher: &[Action::Read, Action::Create, Action::Update, Action::Delete],
        student: &[Action::Read, Action::Submit],
        school_scope_read: false,
    },
    KindPolicy {
        kind: ResourceKind::Submission,
        teacher: &[Action::Read, Action::Update, Action::Delete],
        student: &[Action::Read, Action::Submit],
        school_scope_read: false,
    },
    KindPolicy {
        kind: ResourceKind::Team,
        teacher: &[
            Action::Read,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::ManageTeam,
        ],
        student: &[Action::Read],
        school_scope_read: true,
    },
    KindPolicy {
        kind: ResourceKind::TeamMember,
        teacher: &[
            Action::Read,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::ManageTeam,
        ],
        student: &[Action::Read],
        school_scope_read: true,
    },
];

/// Platform actions that are not scoped to any resource.
const PLATFORM_TABLE: &[(Action, &[Role])] = &[(Action::ManageUsers, &[Role::Admin])];

/// Static `(kind, action) -> roles` table.
#[derive(Debug, Clone, Copy)]
pub struct RoleMatrix {
    table: &'static [KindPolicy],
}

impl RoleMatrix {
    pub fn new() -> Self {
        Self::with_table(DEFAULT_TABLE)
    }

    /// Build a matrix from a custom table. Kinds missing from the table are
    /// denied for every role.
    pub fn with_table(table: &'static [KindPolicy]) -> Self {
        Self { table }
    }

    pub fn policy_for(&self, kind: ResourceKind) -> Option<&'static KindPolicy> {
        self.table.iter().find(|policy| policy.kind == kind)
    }

    /// Whether `role` may attempt `action` on a resource of `kind`.
    pub fn permits(&self, role: Role, kind: ResourceKind, action: Action) -> bool {
        let Some(policy) = self.policy_for(kind) else {
            return false;
        };
        let allowed: &[Action] = match role {
            Role::Admin => RESOURCE_ACTIONS,
            Role::Teacher => policy.teacher,
            Role::Student => policy.student,
        };
        allowed.contains(&action)
    }

    pub fn school_scope_reads(&self, kind: ResourceKind) -> bool {
        self.policy_for(kind)
            .map(|policy| policy.school_scope_read)
            .unwrap_or(false)
    }

    /// Whether `role` may perform the resource-less platform `action`.
    pub fn permits_platform(&self, role: Role, action: Action) -> bool {
        PLATFORM_TABLE
            .iter()
            .find(|(platform_action, _)| *platform_action == action)
            .map(|(_, roles)| roles.contains(&role))
            .unwrap_or(false)
    }
}

impl Default for RoleMatrix {
    fn default() -> Self {
        Self::new()
    }
}
