//! Role x tier x tenant-scope policy.
//!
//! [`PolicyEvaluator::evaluate`] is a pure function of its arguments: it does
//! no I/O, keeps no state and logs nothing. All store access happens before it
//! is called, in the [`ResourceResolver`](crate::resolver::ResourceResolver).
//!
//! # Policy
//!
//! After the [`RoleMatrix`] admits the role for `(kind, action)`:
//!
//! | Principal             | Allowed when                                     | Reason                 |
//! |-----------------------|--------------------------------------------------|------------------------|
//! | admin, enterprise     | always                                           | `PLATFORM_ADMIN`       |
//! | admin, free           | owns the root project                            | `OWNER_MATCH`          |
//! | teacher               | owns the root project                            | `OWNER_MATCH`          |
//! | teacher               | read-class action, same school, kind allows it   | `SCHOOL_SCOPE`         |
//! | student               | enrolled in the root project                     | `ENROLLED_PARTICIPANT` |
//!
//! A free admin is checked against the teacher column of the role table, so
//! on their own projects they can do exactly what an owning teacher can.
//! Students only ever read or submit their own submissions.
//!
//! A free admin outside their own projects is denied with
//! `TIER_DOWNGRADE_DENIED`, an unenrolled student with
//! `ENROLLED_PARTICIPANT_FAILED`, and everything else with
//! `ROLE_NOT_PERMITTED`.

use crate::decision::{Decision, ReasonCode};
use crate::matrix::RoleMatrix;
use crate::types::{
    Action, ActionClass, Enrollment, Principal, Project, ResourceDescriptor, Role, Tier,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator {
    matrix: RoleMatrix,
}

impl PolicyEvaluator {
    pub fn new(matrix: RoleMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &RoleMatrix {
        &self.matrix
    }

    /// Decide whether `principal` may perform `action` on `resource`, whose
    /// ownership chain ends at `root`.
    ///
    /// `enrollment` is only consulted for students; pass
    /// [`Enrollment::NotApplicable`] for everyone else.
    pub fn evaluate(
        &self,
        principal: &Principal,
        resource: &ResourceDescriptor,
        root: &Project,
        enrollment: Enrollment,
        action: Action,
    ) -> Decision {
        let kind = resource.kind();

        if !self.matrix.permits(table_role(principal), kind, action) {
            return Decision::deny(ReasonCode::RoleNotPermitted);
        }

        match principal.role {
            Role::Admin => match principal.tier {
                Tier::Enterprise => Decision::allow(ReasonCode::PlatformAdmin),
                Tier::Free if root.is_owned_by(principal) => {
                    Decision::allow(ReasonCode::OwnerMatch)
                }
                Tier::Free => Decision::deny(ReasonCode::TierDowngradeDenied),
            },
            Role::Teacher => {
                if root.is_owned_by(principal) {
                    Decision::allow(ReasonCode::OwnerMatch)
                } else if action.is_read_class()
                    && self.matrix.school_scope_reads(kind)
                    && root.shares_school_with(principal)
                {
                    Decision::allow(ReasonCode::SchoolScope)
                } else {
                    Decision::deny(ReasonCode::RoleNotPermitted)
                }
            }
            Role::Student => self.evaluate_student(principal, resource, enrollment, action),
        }
    }

    fn evaluate_student(
        &self,
        principal: &Principal,
        resource: &ResourceDescriptor,
        enrollment: Enrollment,
        action: Action,
    ) -> Decision {
        match action.class() {
            ActionClass::Read | ActionClass::OwnSubmission => {
                if let ResourceDescriptor::Submission(submission) = resource {
                    if submission.student_id != principal.id {
                        return Decision::deny(ReasonCode::RoleNotPermitted);
                    }
                }
            }
            ActionClass::Mutating => return Decision::deny(ReasonCode::RoleNotPermitted),
        }

        match enrollment {
            Enrollment::Enrolled => Decision::allow(ReasonCode::EnrolledParticipant),
            Enrollment::NotEnrolled | Enrollment::NotApplicable => {
                Decision::deny(ReasonCode::EnrolledParticipantFailed)
            }
        }
    }
}

/// Role column of the [`RoleMatrix`] that applies to `principal`.
fn table_role(principal: &Principal) -> Role {
    match (principal.role, principal.tier) {
        (Role::Admin, Tier::Free) => Role::Teacher,
        (role, _) => role,
    }
}
