//! Request-facing entry point of the authorization engine.
//!
//! # Authorization Flow
//!
//! [`Gate::authorize`] runs these steps in a fixed order. The first failing
//! step ends the request:
//!
//! 1. Parse the raw id as a positive integer (`400`)
//! 2. Require an authenticated principal (`401`)
//! 3. Check the tier requirement of the action, before any store read (`403`)
//! 4. Resolve the resource and its root project (`404`, or `500` on store failure)
//! 5. Evaluate the role x tier x tenant policy (`403`)
//! 6. Apply the caller's narrowing predicate, if any (`403`)
//!
//! The predicate only ever sees requests the base policy already allowed, so a
//! route-specific refinement cannot widen access.
//!
//! On success the resolved resource and project are returned in
//! [`Authorized`] so the handler can use them without fetching again.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::decision::{Decision, ReasonCode};
use crate::error::{AuthzError, ResolveError, Result};
use crate::matrix::RoleMatrix;
use crate::policy::PolicyEvaluator;
use crate::resolver::{ResolutionMemo, ResourceResolver, ResourceStore};
use crate::tier::TierGate;
use crate::types::{Action, Principal, Project, ResourceDescriptor, ResourceKind};

/// Route-specific refinement applied after the base policy allowed a request.
///
/// Returning `false` denies the request with `ROLE_NOT_PERMITTED`. The
/// predicate may borrow request-local state for `'a`.
pub type CustomPredicate<'a> = dyn Fn(&Principal, &ResourceDescriptor) -> bool + Send + Sync + 'a;

/// A request that passed every gate step.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub principal: Principal,
    pub action: Action,
    pub resource: ResourceDescriptor,
    pub project: Project,
    pub decision: Decision,
}

/// The authorization gate. Built once at startup and shared by reference.
///
/// The gate holds no per-request state; every call to [`Gate::authorize`]
/// creates its own [`ResolutionMemo`].
#[derive(Clone)]
pub struct Gate {
    resolver: ResourceResolver,
    evaluator: PolicyEvaluator,
    tiers: TierGate,
}

impl Gate {
    /// Create a gate with the default role matrix and tier table.
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self::from_parts(
            ResourceResolver::new(store),
            PolicyEvaluator::new(RoleMatrix::new()),
            TierGate::new(),
        )
    }

    pub fn from_parts(
        resolver: ResourceResolver,
        evaluator: PolicyEvaluator,
        tiers: TierGate,
    ) -> Self {
        Self {
            resolver,
            evaluator,
            tiers,
        }
    }

    /// Parse a raw path parameter as a positive resource id.
    ///
    /// Only ASCII digits are accepted, so signs, whitespace and exponents are
    /// rejected rather than normalised.
    pub fn parse_id(raw: &str) -> Result<i64> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthzError::Validation(format!(
                "expected a positive integer, got {:?}",
                raw
            )));
        }
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(AuthzError::Validation(format!(
                "expected a positive integer, got {:?}",
                raw
            ))),
        }
    }

    /// Authorize `principal` to perform `action` on resource `kind`/`raw_id`.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        kind: ResourceKind,
        raw_id: &str,
        action: Action,
        predicate: Option<&CustomPredicate<'_>>,
    ) -> Result<Authorized> {
        let id = Self::parse_id(raw_id)?;

        let Some(principal) = principal else {
            warn!("GATE: no principal for {} on {} {}", action, kind, id);
            return Err(AuthzError::AuthenticationMissing);
        };

        if !self.tiers.admits(principal, action) {
            warn!(
                "GATE: Access DENIED for {} {} {} {}: tier {} below requirement",
                principal.role, principal.id, action, kind, principal.tier
            );
            return Err(AuthzError::denied(ReasonCode::TierDowngradeDenied));
        }

        let mut memo = ResolutionMemo::new();
        let (resource, project) = match self.resolve(&mut memo, kind, id).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.log_resolve_failure(principal, action, err)),
        };

        let enrollment = self
            .resolver
            .enrollment(principal, &project)
            .await
            .map_err(|err| self.log_resolve_failure(principal, action, err))?;

        let decision = self
            .evaluator
            .evaluate(principal, &resource, &project, enrollment, action);

        if !decision.is_allowed() {
            warn!(
                "GATE: Access DENIED for {} {} {} {} {} (project {}): {}",
                principal.role,
                principal.id,
                action,
                kind,
                id,
                project.id,
                decision.reason()
            );
            return Err(AuthzError::denied(decision.reason()));
        }

        if let Some(predicate) = predicate {
            if !predicate(principal, &resource) {
                warn!(
                    "GATE: Access DENIED for {} {} {} {} {}: route predicate rejected",
                    principal.role, principal.id, action, kind, id
                );
                return Err(AuthzError::denied(ReasonCode::RoleNotPermitted));
            }
        }

        info!(
            "GATE: Access ALLOWED for {} {} {} {} {} (project {}): {}",
            principal.role,
            principal.id,
            action,
            kind,
            id,
            project.id,
            decision.reason()
        );
        debug!("GATE: resolved with {} store read(s)", memo.store_reads());

        Ok(Authorized {
            principal: principal.clone(),
            action,
            decision: decision.with_resolution(project.clone(), resource.clone()),
            resource,
            project,
        })
    }

    /// Authorize a platform action that is not scoped to any resource, such
    /// as user management.
    pub fn authorize_platform(
        &self,
        principal: Option<&Principal>,
        action: Action,
    ) -> Result<Decision> {
        let Some(principal) = principal else {
            warn!("GATE: no principal for platform action {}", action);
            return Err(AuthzError::AuthenticationMissing);
        };

        if !self.tiers.admits(principal, action) {
            warn!(
                "GATE: Access DENIED for {} {} platform {}: tier {} below requirement",
                principal.role, principal.id, action, principal.tier
            );
            return Err(AuthzError::denied(ReasonCode::TierDowngradeDenied));
        }

        if !self
            .evaluator
            .matrix()
            .permits_platform(principal.role, action)
        {
            warn!(
                "GATE: Access DENIED for {} {} platform {}",
                principal.role, principal.id, action
            );
            return Err(AuthzError::denied(ReasonCode::RoleNotPermitted));
        }

        info!(
            "GATE: Access ALLOWED for {} {} platform {}",
            principal.role, principal.id, action
        );
        Ok(Decision::allow(ReasonCode::PlatformAdmin))
    }

    async fn resolve(
        &self,
        memo: &mut ResolutionMemo,
        kind: ResourceKind,
        id: i64,
    ) -> std::result::Result<(ResourceDescriptor, Project), ResolveError> {
        let resource = self.resolver.resolve(memo, kind, id).await?;
        let project = self.resolver.resolve_root_project(memo, &resource).await?;
        Ok((resource, project))
    }

    fn log_resolve_failure(
        &self,
        principal: &Principal,
        action: Action,
        err: ResolveError,
    ) -> AuthzError {
        match &err {
            ResolveError::NotFound { kind, id } => {
                debug!(
                    "GATE: {} {} not found for {} {} {}",
                    kind, id, principal.role, principal.id, action
                );
            }
            ResolveError::BrokenChain { kind, id, missing } => {
                error!(
                    "GATE: DATA INTEGRITY: {} {} has no resolvable {} ancestor; denying {} {} {}",
                    kind, id, missing, principal.role, principal.id, action
                );
            }
            ResolveError::Store(store_err) => {
                error!(
                    "GATE: store failure while authorizing {} {} {}: {}",
                    principal.role, principal.id, action, store_err
                );
            }
        }
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::types::{Assessment, Milestone, Submission, Team, TeamMember, Tier};

    const T1: i64 = 1;
    const T2: i64 = 2;
    const STUDENT: i64 = 30;

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with(ResourceDescriptor::Project(Project {
                id: 1,
                teacher_id: T2,
                school_id: Some(5),
                is_public: false,
            }))
            .with(ResourceDescriptor::Milestone(Milestone {
                id: 10,
                project_id: Some(1),
            }))
            .with(ResourceDescriptor::Assessment(Assessment {
                id: 20,
                milestone_id: Some(10),
            }))
            .with(ResourceDescriptor::Submission(Submission {
                id: 30,
                student_id: STUDENT,
                assessment_id: Some(20),
            }))
            .with(ResourceDescriptor::Submission(Submission {
                id: 33,
                student_id: 31,
                assessment_id: Some(20),
            }))
            .with(ResourceDescriptor::Team(Team {
                id: 40,
                project_id: Some(1),
            }))
            .with(ResourceDescriptor::TeamMember(TeamMember {
                id: 41,
                team_id: Some(40),
                student_id: STUDENT,
            }))
            .with(ResourceDescriptor::Milestone(Milestone {
                id: 99,
                project_id: None,
            }))
    }

    fn gate_with(store: InMemoryStore) -> (Gate, Arc<InMemoryStore>) {
        let store = Arc::new(store);
        (Gate::new(store.clone()), store)
    }

    fn reason(err: &AuthzError) -> Option<ReasonCode> {
        err.reason_code()
    }

    #[tokio::test]
    async fn test_scenario_a_school_scope_read_but_no_delete() {
        let (gate, _) = gate_with(store());
        let t1 = Principal::teacher(T1, Tier::Free).with_school(5);

        let read = gate
            .authorize(Some(&t1), ResourceKind::Milestone, "10", Action::Read, None)
            .await
            .unwrap();
        assert_eq!(read.decision.reason(), ReasonCode::SchoolScope);
        assert_eq!(read.project.teacher_id, T2);

        let delete = gate
            .authorize(Some(&t1), ResourceKind::Milestone, "10", Action::Delete, None)
            .await
            .unwrap_err();
        assert_eq!(delete.status_code(), 403);
        assert_eq!(reason(&delete), Some(ReasonCode::RoleNotPermitted));
    }

    #[tokio::test]
    async fn test_scenario_b_student_not_on_team() {
        let (gate, _) = gate_with(store());
        let err = gate
            .authorize(
                Some(&Principal::student(31)),
                ResourceKind::Milestone,
                "10",
                Action::Read,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(reason(&err), Some(ReasonCode::EnrolledParticipantFailed));
    }

    #[tokio::test]
    async fn test_team_member_student_reads_milestone() {
        let (gate, _) = gate_with(store());
        let ok = gate
            .authorize(
                Some(&Principal::student(STUDENT)),
                ResourceKind::Milestone,
                "10",
                Action::Read,
                None,
            )
            .await
            .unwrap();
        assert_eq!(ok.decision.reason(), ReasonCode::EnrolledParticipant);
    }

    #[tokio::test]
    async fn test_scenario_c_free_admin_foreign_project() {
        let (gate, _) = gate_with(store());
        let err = gate
            .authorize(
                Some(&Principal::admin(T1, Tier::Free)),
                ResourceKind::Project,
                "1",
                Action::Read,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(reason(&err), Some(ReasonCode::TierDowngradeDenied));
    }

    #[tokio::test]
    async fn test_scenario_d_broken_chain_is_404() {
        let (gate, _) = gate_with(store());
        let err = gate
            .authorize(
                Some(&Principal::admin(T1, Tier::Enterprise)),
                ResourceKind::Milestone,
                "99",
                Action::Read,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(reason(&err), Some(ReasonCode::BrokenChain));
    }

    #[tokio::test]
    async fn test_absent_resource_is_plain_not_found() {
        let (gate, _) = gate_with(store());
        let err = gate
            .authorize(
                Some(&Principal::admin(T1, Tier::Enterprise)),
                ResourceKind::Team,
                "404",
                Action::Read,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(reason(&err), Some(ReasonCode::ResourceNotFound));
    }

    #[tokio::test]
    async fn test_invalid_ids_are_rejected_before_anything_else() {
        let (gate, store) = gate_with(store());
        for raw in ["", "0", "-1", "+5", "abc", " 7", "1.5", "99999999999999999999"] {
            let err = gate
                .authorize(None, ResourceKind::Project, raw, Action::Read, None)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthzError::Validation(_)), "{:?} accepted", raw);
        }
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_principal() {
        let (gate, store) = gate_with(store());
        let err = gate
            .authorize(None, ResourceKind::Project, "1", Action::Read, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_tier_gate_runs_before_any_fetch() {
        let (gate, store) = gate_with(store());
        let owner = Principal::teacher(T2, Tier::Free);
        let err = gate
            .authorize(
                Some(&owner),
                ResourceKind::Project,
                "1",
                Action::ViewAnalytics,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(reason(&err), Some(ReasonCode::TierDowngradeDenied));
        assert_eq!(store.fetch_count(), 0);

        let owner = Principal::teacher(T2, Tier::Enterprise);
        let ok = gate
            .authorize(
                Some(&owner),
                ResourceKind::Project,
                "1",
                Action::ViewAnalytics,
                None,
            )
            .await
            .unwrap();
        assert_eq!(ok.decision.reason(), ReasonCode::OwnerMatch);
    }

    #[tokio::test]
    async fn test_enrolled_student_cannot_read_classmate_submission() {
        let (gate, _) = gate_with(store());
        let student = Principal::student(STUDENT);

        let own = gate
            .authorize(Some(&student), ResourceKind::Submission, "30", Action::Read, None)
            .await
            .unwrap();
        assert_eq!(own.decision.reason(), ReasonCode::EnrolledParticipant);

        let err = gate
            .authorize(Some(&student), ResourceKind::Submission, "33", Action::Read, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(reason(&err), Some(ReasonCode::RoleNotPermitted));
    }

    #[tokio::test]
    async fn test_predicate_cannot_widen_access() {
        let (gate, _) = gate_with(store());
        let always: &CustomPredicate<'_> = &|_, _| true;

        // A student may never delete, whatever the predicate says.
        let err = gate
            .authorize(
                Some(&Principal::student(STUDENT)),
                ResourceKind::Milestone,
                "10",
                Action::Delete,
                Some(always),
            )
            .await
            .unwrap_err();
        assert_eq!(reason(&err), Some(ReasonCode::RoleNotPermitted));
    }

    #[tokio::test]
    async fn test_predicate_only_runs_after_policy_allows() {
        let (gate, _) = gate_with(store());
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let counting = |_: &Principal, _: &ResourceDescriptor| {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            true
        };

        let _ = gate
            .authorize(
                Some(&Principal::student(31)),
                ResourceKind::Milestone,
                "10",
                Action::Read,
                Some(&counting),
            )
            .await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        gate.authorize(
            Some(&Principal::student(STUDENT)),
            ResourceKind::Milestone,
            "10",
            Action::Read,
            Some(&counting),
        )
        .await
        .unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_predicate_narrows() {
        let (gate, _) = gate_with(store());
        let deny_all: &CustomPredicate<'_> = &|_, _| false;
        let owner = Principal::teacher(T2, Tier::Free);

        let err = gate
            .authorize(
                Some(&owner),
                ResourceKind::Project,
                "1",
                Action::Read,
                Some(deny_all),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(reason(&err), Some(ReasonCode::RoleNotPermitted));
    }

    #[tokio::test]
    async fn test_success_carries_resolution() {
        let (gate, store) = gate_with(store());
        let owner = Principal::teacher(T2, Tier::Free);
        let ok = gate
            .authorize(Some(&owner), ResourceKind::Submission, "30", Action::Read, None)
            .await
            .unwrap();

        assert_eq!(ok.resource.id(), 30);
        assert_eq!(ok.project.id, 1);
        assert_eq!(ok.decision.resolved_project(), Some(&ok.project));
        assert_eq!(ok.decision.resolved_resource(), Some(&ok.resource));
        // Submission, assessment, milestone, project.
        assert_eq!(store.fetch_count(), 4);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced_not_denied() {
        let (gate, _) = gate_with(store().failing_on(ResourceKind::Assessment));
        let owner = Principal::teacher(T2, Tier::Free);
        let err = gate
            .authorize(Some(&owner), ResourceKind::Submission, "30", Action::Read, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Store(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_platform_actions() {
        let gate = Gate::new(Arc::new(InMemoryStore::new()));

        let free_admin = Principal::admin(1, Tier::Free);
        let decision = gate
            .authorize_platform(Some(&free_admin), Action::ManageUsers)
            .unwrap();
        assert_eq!(decision.reason(), ReasonCode::PlatformAdmin);

        let teacher = Principal::teacher(2, Tier::Enterprise);
        let err = gate
            .authorize_platform(Some(&teacher), Action::ManageUsers)
            .unwrap_err();
        assert_eq!(reason(&err), Some(ReasonCode::RoleNotPermitted));

        let err = gate
            .authorize_platform(Some(&free_admin), Action::ViewAnalytics)
            .unwrap_err();
        assert_eq!(reason(&err), Some(ReasonCode::TierDowngradeDenied));

        let err = gate.authorize_platform(None, Action::ManageUsers).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_gate_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Gate>();
    }
}
