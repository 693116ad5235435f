//! Ownership chain resolution.
//!
//! The resolver turns `(kind, id)` into a [`ResourceDescriptor`] and walks the
//! descriptor's parent references up to its root [`Project`]. The walk is
//! bounded by [`MAX_CHAIN_HOPS`] and fails closed: a missing parent reference,
//! a missing parent row or an over-long chain is a [`ResolveError::BrokenChain`].
//!
//! Resolution only reads from the injected [`ResourceStore`]. Descriptors are
//! cached in a [`ResolutionMemo`] that lives for a single request, so the
//! handler that runs after the gate never fetches the same row twice.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{ResolveError, StoreError};
use crate::types::{
    Assessment, Enrollment, Milestone, ParentLink, Principal, Project, ResourceDescriptor,
    ResourceKind, Role, Submission, Team, TeamMember,
};

/// Longest possible path from any kind to its project
/// (Submission -> Assessment -> Milestone -> Project).
pub const MAX_CHAIN_HOPS: usize = 3;

/// Read port onto the resource storage, one fetch per kind.
///
/// Implementations return `Ok(None)` for an absent row and reserve `Err` for
/// infrastructure faults. Calls run inside the caller's future, so they inherit
/// its deadline and cancellation.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn fetch_project(&self, id: i64) -> Result<Option<Project>, StoreError>;

    async fn fetch_milestone(&self, id: i64) -> Result<Option<Milestone>, StoreError>;

    async fn fetch_assessment(&self, id: i64) -> Result<Option<Assessment>, StoreError>;

    async fn fetch_submission(&self, id: i64) -> Result<Option<Submission>, StoreError>;

    async fn fetch_team(&self, id: i64) -> Result<Option<Team>, StoreError>;

    async fn fetch_team_member(&self, id: i64) -> Result<Option<TeamMember>, StoreError>;

    /// Whether `student_id` participates in `project_id`, either through a
    /// team under the project or a direct assignment.
    async fn is_participant(&self, project_id: i64, student_id: i64) -> Result<bool, StoreError>;

    /// Fetch any kind by id.
    async fn fetch(
        &self,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Option<ResourceDescriptor>, StoreError> {
        let descriptor = match kind {
            ResourceKind::Project => self.fetch_project(id).await?.map(ResourceDescriptor::Project),
            ResourceKind::Milestone => self
                .fetch_milestone(id)
                .await?
                .map(ResourceDescriptor::Milestone),
            ResourceKind::Assessment => self
                .fetch_assessment(id)
                .await?
                .map(ResourceDescriptor::Assessment),
            ResourceKind::Submission => self
                .fetch_submission(id)
                .await?
                .map(ResourceDescriptor::Submission),
            ResourceKind::Team => self.fetch_team(id).await?.map(ResourceDescriptor::Team),
            ResourceKind::TeamMember => self
                .fetch_team_member(id)
                .await?
                .map(ResourceDescriptor::TeamMember),
        };
        Ok(descriptor)
    }
}

/// Request-scoped cache of fetched descriptors.
///
/// Never share a memo between requests: ownership can change between them.
#[derive(Debug, Default)]
pub struct ResolutionMemo {
    entries: HashMap<(ResourceKind, i64), ResourceDescriptor>,
    store_reads: usize,
}

impl ResolutionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ResourceKind, id: i64) -> Option<&ResourceDescriptor> {
        self.entries.get(&(kind, id))
    }

    fn insert(&mut self, descriptor: ResourceDescriptor) {
        self.entries
            .insert((descriptor.kind(), descriptor.id()), descriptor);
    }

    /// Number of store reads performed through this memo.
    pub fn store_reads(&self) -> usize {
        self.store_reads
    }
}

/// Resolves resources and their root projects through a [`ResourceStore`].
#[derive(Clone)]
pub struct ResourceResolver {
    store: Arc<dyn ResourceStore>,
}

impl ResourceResolver {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    async fn load(
        &self,
        memo: &mut ResolutionMemo,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Option<ResourceDescriptor>, StoreError> {
        if let Some(hit) = memo.get(kind, id) {
            debug!("RESOLVER: memo hit for {} {}", kind, id);
            return Ok(Some(hit.clone()));
        }

        memo.store_reads += 1;
        let fetched = self.store.fetch(kind, id).await?;
        if let Some(descriptor) = &fetched {
            memo.insert(descriptor.clone());
        }
        Ok(fetched)
    }

    /// Fetch the resource `kind`/`id`.
    pub async fn resolve(
        &self,
        memo: &mut ResolutionMemo,
        kind: ResourceKind,
        id: i64,
    ) -> Result<ResourceDescriptor, ResolveError> {
        match self.load(memo, kind, id).await? {
            Some(descriptor) => Ok(descriptor),
            None => {
                debug!("RESOLVER: {} {} not found", kind, id);
                Err(ResolveError::NotFound { kind, id })
            }
        }
    }

    /// Walk `resource`'s parent references up to its owning project.
    pub async fn resolve_root_project(
        &self,
        memo: &mut ResolutionMemo,
        resource: &ResourceDescriptor,
    ) -> Result<Project, ResolveError> {
        let broken = |missing: ResourceKind| ResolveError::BrokenChain {
            kind: resource.kind(),
            id: resource.id(),
            missing,
        };

        let mut current = resource.clone();
        let mut hops = 0;

        loop {
            if let ResourceDescriptor::Project(project) = &current {
                debug!(
                    "RESOLVER: {} {} resolved to project {} in {} hop(s)",
                    resource.kind(),
                    resource.id(),
                    project.id,
                    hops
                );
                return Ok(project.clone());
            }

            let ParentLink::Parent {
                kind: parent_kind,
                id: parent_id,
            } = current.parent_link()
            else {
                error!(
                    "RESOLVER: {} {} is neither a project nor has a parent link",
                    current.kind(),
                    current.id()
                );
                return Err(broken(ResourceKind::Project));
            };

            if hops == MAX_CHAIN_HOPS {
                error!(
                    "RESOLVER: BROKEN CHAIN for {} {}: exceeded {} hops at {} {}",
                    resource.kind(),
                    resource.id(),
                    MAX_CHAIN_HOPS,
                    current.kind(),
                    current.id()
                );
                return Err(broken(parent_kind));
            }

            let Some(parent_id) = parent_id else {
                error!(
                    "RESOLVER: BROKEN CHAIN for {} {}: {} {} has no {} reference",
                    resource.kind(),
                    resource.id(),
                    current.kind(),
                    current.id(),
                    parent_kind
                );
                return Err(broken(parent_kind));
            };

            current = match self.load(memo, parent_kind, parent_id).await? {
                Some(parent) => parent,
                None => {
                    error!(
                        "RESOLVER: BROKEN CHAIN for {} {}: {} {} references missing {} {}",
                        resource.kind(),
                        resource.id(),
                        current.kind(),
                        current.id(),
                        parent_kind,
                        parent_id
                    );
                    return Err(broken(parent_kind));
                }
            };
            hops += 1;
        }
    }

    /// Look up whether a student participates in `project`.
    ///
    /// Returns [`Enrollment::NotApplicable`] without touching the store for
    /// every other role.
    pub async fn enrollment(
        &self,
        principal: &Principal,
        project: &Project,
    ) -> Result<Enrollment, ResolveError> {
        if principal.role != Role::Student {
            return Ok(Enrollment::NotApplicable);
        }

        let enrolled = self.store.is_participant(project.id, principal.id).await?;
        debug!(
            "RESOLVER: student {} enrolled in project {}: {}",
            principal.id, project.id, enrolled
        );
        Ok(if enrolled {
            Enrollment::Enrolled
        } else {
            Enrollment::NotEnrolled
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::types::Tier;

    fn fixture() -> InMemoryStore {
        InMemoryStore::new()
            .with(ResourceDescriptor::Project(Project {
                id: 1,
                teacher_id: 10,
                school_id: Some(5),
                is_public: false,
            }))
            .with(ResourceDescriptor::Milestone(Milestone {
                id: 2,
                project_id: Some(1),
            }))
            .with(ResourceDescriptor::Assessment(Assessment {
                id: 3,
                milestone_id: Some(2),
            }))
            .with(ResourceDescriptor::Submission(Submission {
                id: 4,
                student_id: 30,
                assessment_id: Some(3),
            }))
            .with(ResourceDescriptor::Team(Team {
                id: 5,
                project_id: Some(1),
            }))
            .with(ResourceDescriptor::TeamMember(TeamMember {
                id: 6,
                team_id: Some(5),
                student_id: 30,
            }))
    }

    fn resolver(store: InMemoryStore) -> (ResourceResolver, Arc<InMemoryStore>) {
        let store = Arc::new(store);
        (ResourceResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let (resolver, _) = resolver(fixture());
        let mut memo = ResolutionMemo::new();
        let err = resolver
            .resolve(&mut memo, ResourceKind::Milestone, 99)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: ResourceKind::Milestone,
                id: 99
            }
        ));
    }

    #[tokio::test]
    async fn test_every_kind_reaches_the_same_project() {
        let (resolver, _) = resolver(fixture());
        for (kind, id) in [
            (ResourceKind::Project, 1),
            (ResourceKind::Milestone, 2),
            (ResourceKind::Assessment, 3),
            (ResourceKind::Submission, 4),
            (ResourceKind::Team, 5),
            (ResourceKind::TeamMember, 6),
        ] {
            let mut memo = ResolutionMemo::new();
            let resource = resolver.resolve(&mut memo, kind, id).await.unwrap();
            let project = resolver
                .resolve_root_project(&mut memo, &resource)
                .await
                .unwrap();
            assert_eq!(project.id, 1, "{} {} resolved elsewhere", kind, id);
        }
    }

    #[tokio::test]
    async fn test_submission_chain_matches_assessment_chain() {
        let (resolver, _) = resolver(fixture());

        let mut memo = ResolutionMemo::new();
        let submission = resolver
            .resolve(&mut memo, ResourceKind::Submission, 4)
            .await
            .unwrap();
        let via_submission = resolver
            .resolve_root_project(&mut memo, &submission)
            .await
            .unwrap();
        // One read for the submission and one per hop.
        assert_eq!(memo.store_reads(), 4);

        let mut memo = ResolutionMemo::new();
        let assessment = resolver
            .resolve(&mut memo, ResourceKind::Assessment, 3)
            .await
            .unwrap();
        let via_assessment = resolver
            .resolve_root_project(&mut memo, &assessment)
            .await
            .unwrap();

        assert_eq!(via_submission, via_assessment);
    }

    #[tokio::test]
    async fn test_null_parent_is_broken_chain() {
        let store = fixture().with(ResourceDescriptor::Milestone(Milestone {
            id: 20,
            project_id: None,
        }));
        let (resolver, _) = resolver(store);
        let mut memo = ResolutionMemo::new();

        let milestone = resolver
            .resolve(&mut memo, ResourceKind::Milestone, 20)
            .await
            .unwrap();
        let err = resolver
            .resolve_root_project(&mut memo, &milestone)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::BrokenChain {
                kind: ResourceKind::Milestone,
                id: 20,
                missing: ResourceKind::Project
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_parent_row_is_broken_chain() {
        // Assessment points at a milestone that does not exist.
        let store = fixture()
            .with(ResourceDescriptor::Assessment(Assessment {
                id: 40,
                milestone_id: Some(404),
            }))
            .with(ResourceDescriptor::Submission(Submission {
                id: 41,
                student_id: 30,
                assessment_id: Some(40),
            }));
        let (resolver, _) = resolver(store);
        let mut memo = ResolutionMemo::new();

        let submission = resolver
            .resolve(&mut memo, ResourceKind::Submission, 41)
            .await
            .unwrap();
        let err = resolver
            .resolve_root_project(&mut memo, &submission)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::BrokenChain {
                kind: ResourceKind::Submission,
                id: 41,
                missing: ResourceKind::Milestone
            }
        ));
    }

    #[tokio::test]
    async fn test_memo_avoids_duplicate_fetches() {
        let (resolver, store) = resolver(fixture());
        let mut memo = ResolutionMemo::new();

        let team_member = resolver
            .resolve(&mut memo, ResourceKind::TeamMember, 6)
            .await
            .unwrap();
        resolver
            .resolve_root_project(&mut memo, &team_member)
            .await
            .unwrap();
        let reads_after_first = store.fetch_count();

        // Everything on the chain is now memoized.
        resolver
            .resolve(&mut memo, ResourceKind::Team, 5)
            .await
            .unwrap();
        resolver
            .resolve_root_project(&mut memo, &team_member)
            .await
            .unwrap();
        assert_eq!(store.fetch_count(), reads_after_first);
        assert_eq!(memo.store_reads(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_converted() {
        let (resolver, _) = resolver(fixture().failing_on(ResourceKind::Project));
        let mut memo = ResolutionMemo::new();

        let milestone = resolver
            .resolve(&mut memo, ResourceKind::Milestone, 2)
            .await
            .unwrap();
        let err = resolver
            .resolve_root_project(&mut memo, &milestone)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
    }

    #[tokio::test]
    async fn test_enrollment_lookup() {
        let store = fixture().with_assignment(1, 31);
        let (resolver, store) = resolver(store);
        let project = store.fetch_project(1).await.unwrap().unwrap();

        // Team member
        let enrollment = resolver
            .enrollment(&Principal::student(30), &project)
            .await
            .unwrap();
        assert_eq!(enrollment, Enrollment::Enrolled);

        // Direct assignment
        let enrollment = resolver
            .enrollment(&Principal::student(31), &project)
            .await
            .unwrap();
        assert_eq!(enrollment, Enrollment::Enrolled);

        let enrollment = resolver
            .enrollment(&Principal::student(32), &project)
            .await
            .unwrap();
        assert_eq!(enrollment, Enrollment::NotEnrolled);

        let enrollment = resolver
            .enrollment(&Principal::teacher(10, Tier::Free), &project)
            .await
            .unwrap();
        assert_eq!(enrollment, Enrollment::NotApplicable);
    }
}
