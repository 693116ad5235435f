use async_trait::async_trait;
use authz::{
    Assessment, Milestone, Project, ResourceStore, StoreError, Submission, Team, TeamMember,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{Database, DatabaseError, Result};

/// SQLite implementation of the authorization engine's [`ResourceStore`] port.
///
/// Reads are single-row lookups by primary key. The `upsert_*` methods are
/// used by seeding and tests; regular resource CRUD lives outside this crate.
#[derive(Debug, Clone)]
pub struct SqliteResourceStore {
    db: Arc<Database>,
}

impl SqliteResourceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn upsert_project(&self, project: &Project) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO projects (id, teacher_id, school_id, is_public) VALUES (?, ?, ?, ?)",
        )
        .bind(project.id)
        .bind(project.teacher_id)
        .bind(project.school_id)
        .bind(project.is_public)
        .execute(self.db.pool())
        .await?;
        debug!("Stored project {}", project.id);
        Ok(())
    }

    pub async fn upsert_milestone(&self, milestone: &Milestone) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO milestones (id, project_id) VALUES (?, ?)")
            .bind(milestone.id)
            .bind(milestone.project_id)
            .execute(self.db.pool())
            .await?;
        debug!("Stored milestone {}", milestone.id);
        Ok(())
    }

    pub async fn upsert_assessment(&self, assessment: &Assessment) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO assessments (id, milestone_id) VALUES (?, ?)")
            .bind(assessment.id)
            .bind(assessment.milestone_id)
            .execute(self.db.pool())
            .await?;
        debug!("Stored assessment {}", assessment.id);
        Ok(())
    }

    pub async fn upsert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO submissions (id, student_id, assessment_id) VALUES (?, ?, ?)",
        )
        .bind(submission.id)
        .bind(submission.student_id)
        .bind(submission.assessment_id)
        .execute(self.db.pool())
        .await?;
        debug!("Stored submission {}", submission.id);
        Ok(())
    }

    pub async fn upsert_team(&self, team: &Team) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO teams (id, project_id) VALUES (?, ?)")
            .bind(team.id)
            .bind(team.project_id)
            .execute(self.db.pool())
            .await?;
        debug!("Stored team {}", team.id);
        Ok(())
    }

    pub async fn upsert_team_member(&self, member: &TeamMember) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO team_members (id, team_id, student_id) VALUES (?, ?, ?)",
        )
        .bind(member.id)
        .bind(member.team_id)
        .bind(member.student_id)
        .execute(self.db.pool())
        .await?;
        debug!("Stored team member {}", member.id);
        Ok(())
    }

    pub async fn assign_student(&self, project_id: i64, student_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO project_assignments (project_id, student_id) VALUES (?, ?)",
        )
        .bind(project_id)
        .bind(student_id)
        .execute(self.db.pool())
        .await?;
        info!("Assigned student {} to project {}", student_id, project_id);
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for SqliteResourceStore {
    async fn fetch_project(&self, id: i64) -> std::result::Result<Option<Project>, StoreError> {
        let row: Option<(i64, i64, Option<i64>, bool)> = sqlx::query_as(
            "SELECT id, teacher_id, school_id, is_public FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, teacher_id, school_id, is_public)| Project {
            id,
            teacher_id,
            school_id,
            is_public,
        }))
    }

    async fn fetch_milestone(&self, id: i64) -> std::result::Result<Option<Milestone>, StoreError> {
        let row: Option<(i64, Option<i64>)> =
            sqlx::query_as("SELECT id, project_id FROM milestones WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, project_id)| Milestone { id, project_id }))
    }

    async fn fetch_assessment(
        &self,
        id: i64,
    ) -> std::result::Result<Option<Assessment>, StoreError> {
        let row: Option<(i64, Option<i64>)> =
            sqlx::query_as("SELECT id, milestone_id FROM assessments WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, milestone_id)| Assessment { id, milestone_id }))
    }

    async fn fetch_submission(
        &self,
        id: i64,
    ) -> std::result::Result<Option<Submission>, StoreError> {
        let row: Option<(i64, i64, Option<i64>)> =
            sqlx::query_as("SELECT id, student_id, assessment_id FROM submissions WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, student_id, assessment_id)| Submission {
            id,
            student_id,
            assessment_id,
        }))
    }

    async fn fetch_team(&self, id: i64) -> std::result::Result<Option<Team>, StoreError> {
        let row: Option<(i64, Option<i64>)> =
            sqlx::query_as("SELECT id, project_id FROM teams WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, project_id)| Team { id, project_id }))
    }

    async fn fetch_team_member(
        &self,
        id: i64,
    ) -> std::result::Result<Option<TeamMember>, StoreError> {
        let row: Option<(i64, Option<i64>, i64)> =
            sqlx::query_as("SELECT id, team_id, student_id FROM team_members WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        Ok(row.map(|(id, team_id, student_id)| TeamMember {
            id,
            team_id,
            student_id,
        }))
    }

    async fn is_participant(
        &self,
        project_id: i64,
        student_id: i64,
    ) -> std::result::Result<bool, StoreError> {
        let query = r#"
            SELECT EXISTS (
                SELECT 1 FROM project_assignments
                WHERE project_id = ?1 AND student_id = ?2
                UNION ALL
                SELECT 1 FROM team_members tm
                JOIN teams t ON t.id = tm.team_id
                WHERE t.project_id = ?1 AND tm.student_id = ?2
            )
        "#;

        let exists: i64 = sqlx::query_scalar(query)
            .bind(project_id)
            .bind(student_id)
            .fetch_one(self.db.pool())
            .await
            .map_err(DatabaseError::from)?;

        Ok(exists != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_tables;

    async fn store() -> SqliteResourceStore {
        let db = Database::in_memory().await.unwrap();
        create_tables(&db).await.unwrap();
        SqliteResourceStore::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_fetch_round_trip_per_kind() {
        let store = store().await;
        let project = Project {
            id: 1,
            teacher_id: 2,
            school_id: Some(5),
            is_public: true,
        };
        store.upsert_project(&project).await.unwrap();
        store
            .upsert_milestone(&Milestone {
                id: 10,
                project_id: Some(1),
            })
            .await
            .unwrap();
        store
            .upsert_submission(&Submission {
                id: 30,
                student_id: 40,
                assessment_id: None,
            })
            .await
            .unwrap();

        assert_eq!(store.fetch_project(1).await.unwrap(), Some(project));
        assert_eq!(
            store.fetch_milestone(10).await.unwrap(),
            Some(Milestone {
                id: 10,
                project_id: Some(1)
            })
        );
        assert_eq!(
            store.fetch_submission(30).await.unwrap().unwrap().assessment_id,
            None
        );
        assert_eq!(store.fetch_team(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_orphaned_rows_keep_null_parents() {
        let store = store().await;
        store
            .upsert_milestone(&Milestone {
                id: 99,
                project_id: None,
            })
            .await
            .unwrap();
        let milestone = store.fetch_milestone(99).await.unwrap().unwrap();
        assert_eq!(milestone.project_id, None);
    }

    #[tokio::test]
    async fn test_participation_via_team_or_assignment() {
        let store = store().await;
        store
            .upsert_team(&Team {
                id: 50,
                project_id: Some(1),
            })
            .await
            .unwrap();
        store
            .upsert_team_member(&TeamMember {
                id: 60,
                team_id: Some(50),
                student_id: 40,
            })
            .await
            .unwrap();
        store.assign_student(1, 41).await.unwrap();
        store.assign_student(1, 41).await.unwrap();

        assert!(store.is_participant(1, 40).await.unwrap());
        assert!(store.is_participant(1, 41).await.unwrap());
        assert!(!store.is_participant(1, 42).await.unwrap());
        assert!(!store.is_participant(2, 40).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_table_is_store_error() {
        let db = Database::in_memory().await.unwrap();
        let store = SqliteResourceStore::new(Arc::new(db));
        let err = store.fetch_project(1).await.unwrap_err();
        assert!(err.message.contains("Database connection error"));
    }
}
