//! Core authorization types for the Classgate authorization engine.
//!
//! A request is always described by the same three things: the authenticated
//! [`Principal`], the [`Action`] it wants to perform, and the resource it wants
//! to perform it on. Resources are modelled as an exhaustive
//! [`ResourceDescriptor`] enum discriminated by [`ResourceKind`], so adding a
//! new kind of resource forces every `match` in the engine to be revisited.
//!
//! # Ownership chain
//!
//! Every resource kind except [`Project`] carries exactly one parent reference.
//! Following those references always ends at a `Project`, which is the only
//! kind that carries the tenant facts (`teacher_id`, `school_id`) that the
//! policy depends on:
//!
//! ```text
//! Submission -> Assessment -> Milestone -> Project
//! TeamMember -> Team -> Project
//! ```
//!
//! Parent references are `Option` because the store can hold orphaned rows.
//! A `None` parent is never skipped; it is reported as a broken chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseTypeError;

/// Role attached to a principal by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(ParseTypeError::new("role", s)),
        }
    }
}

/// Subscription tier of the principal's account.
///
/// Tiers are ordered: `Free < Enterprise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Free, Tier::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Returns true if this tier is at least `required`.
    pub fn satisfies(self, required: Tier) -> bool {
        self >= required
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "enterprise" => Ok(Tier::Enterprise),
            _ => Err(ParseTypeError::new("tier", s)),
        }
    }
}

/// An authenticated actor.
///
/// # Security Note
/// Principals must only be constructed from identity the authentication layer
/// has already validated. The engine trusts every field of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
    pub tier: Tier,
    /// Tenant (school) the principal belongs to, if any.
    pub school_id: Option<i64>,
}

impl Principal {
    pub fn new(id: i64, role: Role, tier: Tier) -> Self {
        Self {
            id,
            role,
            tier,
            school_id: None,
        }
    }

    pub fn with_school(mut self, school_id: i64) -> Self {
        self.school_id = Some(school_id);
        self
    }

    pub fn admin(id: i64, tier: Tier) -> Self {
        Self::new(id, Role::Admin, tier)
    }

    pub fn teacher(id: i64, tier: Tier) -> Self {
        Self::new(id, Role::Teacher, tier)
    }

    pub fn student(id: i64) -> Self {
        Self::new(id, Role::Student, Tier::Free)
    }
}

/// How an action is treated by the tenant-scope rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    /// Never changes state. Same-school visibility may apply.
    Read,
    /// Create, update, delete, visibility toggles and management actions.
    Mutating,
    /// A student acting on their own submission.
    OwnSubmission,
}

/// Something a principal wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    ToggleVisibility,
    /// Create or revise the caller's own submission.
    Submit,
    /// Team management features (forming teams, moving members).
    ManageTeam,
    /// Cross-school analytics.
    ViewAnalytics,
    /// Platform user management. Not scoped to a resource.
    ManageUsers,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::ToggleVisibility,
        Action::Submit,
        Action::ManageTeam,
        Action::ViewAnalytics,
        Action::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::ToggleVisibility => "toggle_visibility",
            Action::Submit => "submit",
            Action::ManageTeam => "manage_team",
            Action::ViewAnalytics => "view_analytics",
            Action::ManageUsers => "manage_users",
        }
    }

    pub fn class(&self) -> ActionClass {
        match self {
            Action::Read | Action::ViewAnalytics => ActionClass::Read,
            Action::Submit => ActionClass::OwnSubmission,
            Action::Create
            | Action::Update
            | Action::Delete
            | Action::ToggleVisibility
            | Action::ManageTeam
            | Action::ManageUsers => ActionClass::Mutating,
        }
    }

    pub fn is_read_class(&self) -> bool {
        self.class() == ActionClass::Read
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ParseTypeError::new("action", s))
    }
}

/// Discriminator for [`ResourceDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Milestone,
    Assessment,
    Submission,
    Team,
    TeamMember,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Project,
        ResourceKind::Milestone,
        ResourceKind::Assessment,
        ResourceKind::Submission,
        ResourceKind::Team,
        ResourceKind::TeamMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Milestone => "milestone",
            ResourceKind::Assessment => "assessment",
            ResourceKind::Submission => "submission",
            ResourceKind::Team => "team",
            ResourceKind::TeamMember => "team_member",
        }
    }

    /// Plural form used in URL paths (`/resources/milestones/7`).
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Project => "projects",
            ResourceKind::Milestone => "milestones",
            ResourceKind::Assessment => "assessments",
            ResourceKind::Submission => "submissions",
            ResourceKind::Team => "teams",
            ResourceKind::TeamMember => "team-members",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseTypeError;

    /// Accepts both the singular name (`team_member`) and the collection name
    /// (`team-members`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                kind.collection() == normalized || kind.as_str().replace('_', "-") == normalized
            })
            .ok_or_else(|| ParseTypeError::new("resource kind", s))
    }
}

/// The tenant-owning root of every ownership chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub teacher_id: i64,
    pub school_id: Option<i64>,
    pub is_public: bool,
}

impl Project {
    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        self.teacher_id == principal.id
    }

    /// True only when both sides carry a school and the schools match.
    pub fn shares_school_with(&self, principal: &Principal) -> bool {
        matches!((principal.school_id, self.school_id), (Some(a), Some(b)) if a == b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub milestone_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: Option<i64>,
    pub student_id: i64,
}

/// Where a resource sits in the ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    /// The resource is a project.
    Root,
    /// The resource points at exactly one parent of `kind`. `id` is `None`
    /// when the parent reference is missing.
    Parent { kind: ResourceKind, id: Option<i64> },
}

/// A resource fetched from the store, carrying only the fields needed to
/// resolve ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    Project(Project),
    Milestone(Milestone),
    Assessment(Assessment),
    Submission(Submission),
    Team(Team),
    TeamMember(TeamMember),
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::Project(_) => ResourceKind::Project,
            ResourceDescriptor::Milestone(_) => ResourceKind::Milestone,
            ResourceDescriptor::Assessment(_) => ResourceKind::Assessment,
            ResourceDescriptor::Submission(_) => ResourceKind::Submission,
            ResourceDescriptor::Team(_) => ResourceKind::Team,
            ResourceDescriptor::TeamMember(_) => ResourceKind::TeamMember,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ResourceDescriptor::Project(r) => r.id,
            ResourceDescriptor::Milestone(r) => r.id,
            ResourceDescriptor::Assessment(r) => r.id,
            ResourceDescriptor::Submission(r) => r.id,
            ResourceDescriptor::Team(r) => r.id,
            ResourceDescriptor::TeamMember(r) => r.id,
        }
    }

    pub fn parent_link(&self) -> ParentLink {
        match self {
            ResourceDescriptor::Project(_) => ParentLink::Root,
            ResourceDescriptor::Milestone(m) => ParentLink::Parent {
                kind: ResourceKind::Project,
                id: m.project_id,
            },
            ResourceDescriptor::Assessment(a) => ParentLink::Parent {
                kind: ResourceKind::Milestone,
                id: a.milestone_id,
            },
            ResourceDescriptor::Submission(s) => ParentLink::Parent {
                kind: ResourceKind::Assessment,
                id: s.assessment_id,
            },
            ResourceDescriptor::Team(t) => ParentLink::Parent {
                kind: ResourceKind::Project,
                id: t.project_id,
            },
            ResourceDescriptor::TeamMember(m) => ParentLink::Parent {
                kind: ResourceKind::Team,
                id: m.team_id,
            },
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            ResourceDescriptor::Project(p) => Some(p),
            _ => None,
        }
    }
}

/// Whether a student participates in the project a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enrollment {
    Enrolled,
    NotEnrolled,
    /// Enrollment was not looked up (non-student principals).
    NotApplicable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_helpers() {
        let principal = Principal::teacher(7, Tier::Free).with_school(5);
        assert_eq!(principal.id, 7);
        assert_eq!(principal.role, Role::Teacher);
        assert_eq!(principal.school_id, Some(5));

        let student = Principal::student(9);
        assert_eq!(student.role, Role::Student);
        assert_eq!(student.school_id, None);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Enterprise.satisfies(Tier::Free));
        assert!(Tier::Enterprise.satisfies(Tier::Enterprise));
        assert!(!Tier::Free.satisfies(Tier::Enterprise));
    }

    #[test]
    fn test_action_classes() {
        assert!(Action::Read.is_read_class());
        assert!(Action::ViewAnalytics.is_read_class());
        assert_eq!(Action::Submit.class(), ActionClass::OwnSubmission);
        for action in [
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::ToggleVisibility,
        ] {
            assert_eq!(action.class(), ActionClass::Mutating);
        }
    }

    #[test]
    fn test_parse_round_trip_names() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert_eq!(
            "toggle-visibility".parse::<Action>().unwrap(),
            Action::ToggleVisibility
        );
        assert!("approve".parse::<Action>().is_err());
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert!("owner".parse::<Role>().is_err());
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_resource_kind_accepts_singular_and_collection() {
        assert_eq!(
            "team-members".parse::<ResourceKind>().unwrap(),
            ResourceKind::TeamMember
        );
        assert_eq!(
            "team_member".parse::<ResourceKind>().unwrap(),
            ResourceKind::TeamMember
        );
        assert_eq!(
            "milestones".parse::<ResourceKind>().unwrap(),
            ResourceKind::Milestone
        );
        assert!("courses".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_parent_links() {
        let submission = ResourceDescriptor::Submission(Submission {
            id: 1,
            student_id: 2,
            assessment_id: Some(3),
        });
        assert_eq!(
            submission.parent_link(),
            ParentLink::Parent {
                kind: ResourceKind::Assessment,
                id: Some(3)
            }
        );

        let orphan = ResourceDescriptor::Milestone(Milestone {
            id: 4,
            project_id: None,
        });
        assert_eq!(
            orphan.parent_link(),
            ParentLink::Parent {
                kind: ResourceKind::Project,
                id: None
            }
        );

        let project = ResourceDescriptor::Project(Project {
            id: 1,
            teacher_id: 2,
            school_id: None,
            is_public: false,
        });
        assert_eq!(project.parent_link(), ParentLink::Root);
    }

    #[test]
    fn test_school_scope_requires_both_sides() {
        let project = Project {
            id: 1,
            teacher_id: 2,
            school_id: None,
            is_public: false,
        };
        let teacher = Principal::teacher(3, Tier::Free);
        assert!(!project.shares_school_with(&teacher));

        let project = Project {
            school_id: Some(5),
            ..project
        };
        assert!(!project.shares_school_with(&teacher));
        assert!(project.shares_school_with(&teacher.with_school(5)));
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let descriptor = ResourceDescriptor::Team(Team {
            id: 3,
            project_id: Some(1),
        });
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "team");
        assert_eq!(json["project_id"], 1);
    }
}
