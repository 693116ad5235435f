//! In-memory [`ResourceStore`] for tests and embedding.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::StoreError;
use crate::resolver::ResourceStore;
use crate::types::{
    Assessment, Milestone, Project, ResourceDescriptor, ResourceKind, Submission, Team, TeamMember,
};

/// A fixed set of resources held in memory.
///
/// The store is built up front with the `with*` methods and is read-only
/// afterwards, so it can be shared between concurrent requests without locks.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    resources: HashMap<(ResourceKind, i64), ResourceDescriptor>,
    /// `(project_id, student_id)` direct assignments.
    assignments: HashSet<(i64, i64)>,
    failing_kind: Option<ResourceKind>,
    fetches: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: ResourceDescriptor) -> Self {
        self.resources
            .insert((resource.kind(), resource.id()), resource);
        self
    }

    pub fn with_assignment(mut self, project_id: i64, student_id: i64) -> Self {
        self.assignments.insert((project_id, student_id));
        self
    }

    /// Make every fetch of `kind` fail with a [`StoreError`].
    pub fn failing_on(mut self, kind: ResourceKind) -> Self {
        self.failing_kind = Some(kind);
        self
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, kind: ResourceKind, id: i64) -> Result<Option<&ResourceDescriptor>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_kind == Some(kind) {
            return Err(StoreError::new(format!("{} table unavailable", kind)));
        }
        Ok(self.resources.get(&(kind, id)))
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn fetch_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(match self.lookup(ResourceKind::Project, id)? {
            Some(ResourceDescriptor::Project(p)) => Some(p.clone()),
            _ => None,
        })
    }

    async fn fetch_milestone(&self, id: i64) -> Result<Option<Milestone>, StoreError> {
        Ok(match self.lookup(ResourceKind::Milestone, id)? {
            Some(ResourceDescriptor::Milestone(m)) => Some(m.clone()),
            _ => None,
        })
    }

    async fn fetch_assessment(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        Ok(match self.lookup(ResourceKind::Assessment, id)? {
            Some(ResourceDescriptor::Assessment(a)) => Some(a.clone()),
            _ => None,
        })
    }

    async fn fetch_submission(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        Ok(match self.lookup(ResourceKind::Submission, id)? {
            Some(ResourceDescriptor::Submission(s)) => Some(s.clone()),
            _ => None,
        })
    }

    async fn fetch_team(&self, id: i64) -> Result<Option<Team>, StoreError> {
        Ok(match self.lookup(ResourceKind::Team, id)? {
            Some(ResourceDescriptor::Team(t)) => Some(t.clone()),
            _ => None,
        })
    }

    async fn fetch_team_member(&self, id: i64) -> Result<Option<TeamMember>, StoreError> {
        Ok(match self.lookup(ResourceKind::TeamMember, id)? {
            Some(ResourceDescriptor::TeamMember(m)) => Some(m.clone()),
            _ => None,
        })
    }

    async fn is_participant(&self, project_id: i64, student_id: i64) -> Result<bool, StoreError> {
        if self.assignments.contains(&(project_id, student_id)) {
            return Ok(true);
        }

        let on_team = self.resources.values().any(|resource| match resource {
            ResourceDescriptor::TeamMember(member) if member.student_id == student_id => member
                .team_id
                .and_then(|team_id| self.resources.get(&(ResourceKind::Team, team_id)))
                .map(|team| {
                    matches!(team, ResourceDescriptor::Team(t) if t.project_id == Some(project_id))
                })
                .unwrap_or(false),
            _ => false,
        });
        Ok(on_team)
    }
}
