//! Authorization decisions and their reason codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Project, ResourceDescriptor};

/// Why a decision came out the way it did.
///
/// The set is exhaustive: every allow and every deny carries exactly one of
/// these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// The principal owns the root project.
    OwnerMatch,
    /// Same-school read access for a non-owning teacher.
    SchoolScope,
    /// The student participates in the root project.
    EnrolledParticipant,
    /// Enterprise admins act platform-wide.
    PlatformAdmin,
    /// The principal's tier does not allow the request.
    TierDowngradeDenied,
    RoleNotPermitted,
    EnrolledParticipantFailed,
    ResourceNotFound,
    BrokenChain,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 9] = [
        ReasonCode::OwnerMatch,
        ReasonCode::SchoolScope,
        ReasonCode::EnrolledParticipant,
        ReasonCode::PlatformAdmin,
        ReasonCode::TierDowngradeDenied,
        ReasonCode::RoleNotPermitted,
        ReasonCode::EnrolledParticipantFailed,
        ReasonCode::ResourceNotFound,
        ReasonCode::BrokenChain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::OwnerMatch => "OWNER_MATCH",
            ReasonCode::SchoolScope => "SCHOOL_SCOPE",
            ReasonCode::EnrolledParticipant => "ENROLLED_PARTICIPANT",
            ReasonCode::PlatformAdmin => "PLATFORM_ADMIN",
            ReasonCode::TierDowngradeDenied => "TIER_DOWNGRADE_DENIED",
            ReasonCode::RoleNotPermitted => "ROLE_NOT_PERMITTED",
            ReasonCode::EnrolledParticipantFailed => "ENROLLED_PARTICIPANT_FAILED",
            ReasonCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ReasonCode::BrokenChain => "BROKEN_CHAIN",
        }
    }

    /// Returns true for the codes that accompany an allow.
    pub fn is_grant(&self) -> bool {
        matches!(
            self,
            ReasonCode::OwnerMatch
                | ReasonCode::SchoolScope
                | ReasonCode::EnrolledParticipant
                | ReasonCode::PlatformAdmin
        )
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy evaluation.
///
/// Fields are private so that `allowed` and `reason` can only be set together
/// through [`Decision::allow`] and [`Decision::deny`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    allowed: bool,
    reason: ReasonCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_project: Option<Project>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_resource: Option<ResourceDescriptor>,
}

impl Decision {
    pub fn allow(reason: ReasonCode) -> Self {
        debug_assert!(reason.is_grant(), "{} cannot grant access", reason);
        Self {
            allowed: true,
            reason,
            resolved_project: None,
            resolved_resource: None,
        }
    }

    pub fn deny(reason: ReasonCode) -> Self {
        debug_assert!(!reason.is_grant(), "{} cannot deny access", reason);
        Self {
            allowed: false,
            reason,
            resolved_project: None,
            resolved_resource: None,
        }
    }

    /// Attach the resolved resource and its root project.
    pub fn with_resolution(mut self, project: Project, resource: ResourceDescriptor) -> Self {
        self.resolved_project = Some(project);
        self.resolved_resource = Some(resource);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn resolved_project(&self) -> Option<&Project> {
        self.resolved_project.as_ref()
    }

    pub fn resolved_resource(&self) -> Option<&ResourceDescriptor> {
        self.resolved_resource.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_wire_names() {
        for reason in ReasonCode::ALL {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, serde_json::Value::String(reason.as_str().to_string()));
        }
    }

    #[test]
    fn test_grant_codes() {
        let grants: Vec<_> = ReasonCode::ALL.iter().filter(|r| r.is_grant()).collect();
        assert_eq!(grants.len(), 4);
        assert!(!ReasonCode::BrokenChain.is_grant());
    }

    #[test]
    fn test_deny_always_carries_reason() {
        let decision = Decision::deny(ReasonCode::EnrolledParticipantFailed);
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason(), ReasonCode::EnrolledParticipantFailed);
        assert!(decision.resolved_project().is_none());
    }
}
