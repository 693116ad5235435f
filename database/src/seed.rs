use authz::{Assessment, Milestone, Project, Submission, Team, TeamMember};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::{DatabaseError, Result, SqliteResourceStore};

const DEMO_SEED: &str = include_str!("../seed/demo.yaml");

/// A direct `(project, student)` assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub project_id: i64,
    pub student_id: i64,
}

/// Resource rows loaded from a YAML seed file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub projects: Vec<Project>,
    pub milestones: Vec<Milestone>,
    pub assessments: Vec<Assessment>,
    pub submissions: Vec<Submission>,
    pub teams: Vec<Team>,
    pub team_members: Vec<TeamMember>,
    pub assignments: Vec<Assignment>,
}

impl SeedData {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| DatabaseError::SeedParsing(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The bundled demo data set.
    pub fn demo() -> Result<Self> {
        Self::from_yaml(DEMO_SEED)
    }

    pub fn row_count(&self) -> usize {
        self.projects.len()
            + self.milestones.len()
            + self.assessments.len()
            + self.submissions.len()
            + self.teams.len()
            + self.team_members.len()
            + self.assignments.len()
    }

    /// Write every row into the store. Existing rows with the same id are replaced.
    pub async fn seed(&self, store: &SqliteResourceStore) -> Result<usize> {
        for project in &self.projects {
            store.upsert_project(project).await?;
        }
        for milestone in &self.milestones {
            store.upsert_milestone(milestone).await?;
        }
        for assessment in &self.assessments {
            store.upsert_assessment(assessment).await?;
        }
        for submission in &self.submissions {
            store.upsert_submission(submission).await?;
        }
        for team in &self.teams {
            store.upsert_team(team).await?;
        }
        for member in &self.team_members {
            store.upsert_team_member(member).await?;
        }
        for assignment in &self.assignments {
            store
                .assign_student(assignment.project_id, assignment.student_id)
                .await?;
        }

        let rows = self.row_count();
        info!("Seeded {} rows", rows);
        Ok(rows)
    }
}
