use anyhow::{anyhow, Result};
use authz::{Action, AuthzError, Gate, Principal, ResourceKind, Role, Tier};
use colored::*;
use database::{DatabaseConfig, SqliteResourceStore};
use serde::Serialize;
use std::sync::Arc;

use crate::utils::service_config::ServiceConfig;

/// Raw command line input for a single check
pub struct CheckRequest {
    pub principal_id: i64,
    pub role: String,
    pub tier: String,
    pub school: Option<i64>,
    pub kind: String,
    pub id: String,
    pub action: String,
}

/// Result of a check as printed to the operator
#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub allowed: bool,
    /// Status a request/response transport would answer with
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    pub message: String,
}

impl CheckOutcome {
    fn from_error(err: &AuthzError) -> Self {
        Self {
            allowed: false,
            status: err.status_code(),
            reason: err.reason_code().map(|r| r.as_str().to_string()),
            project_id: None,
            message: err.to_string(),
        }
    }
}

fn parse_principal(request: &CheckRequest) -> Result<Principal> {
    let role: Role = request.role.parse()?;
    let tier: Tier = request.tier.parse()?;
    let principal = Principal::new(request.principal_id, role, tier);
    Ok(match request.school {
        Some(school_id) => principal.with_school(school_id),
        None => principal,
    })
}

/// Evaluate the request against the configured database and print the decision
pub async fn execute(
    config: &ServiceConfig,
    request: CheckRequest,
    format: &str,
) -> Result<CheckOutcome> {
    let principal = parse_principal(&request)?;
    let kind: ResourceKind = request.kind.parse()?;
    let action: Action = request.action.parse()?;

    let db = database::initialize_database(
        DatabaseConfig::new().with_database_path(config.database_path()),
    )
    .await?;
    let gate = Gate::new(Arc::new(SqliteResourceStore::new(db)));

    let outcome = match gate
        .authorize(Some(&principal), kind, &request.id, action, None)
        .await
    {
        Ok(authorized) => CheckOutcome {
            allowed: true,
            status: 200,
            reason: Some(authorized.decision.reason().as_str().to_string()),
            project_id: Some(authorized.project.id),
            message: format!(
                "{} {} may {} {} {}",
                principal.role, principal.id, action, kind, request.id
            ),
        },
        // Store faults are not decisions
        Err(AuthzError::Store(e)) => return Err(anyhow!(e)),
        Err(e) => CheckOutcome::from_error(&e),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        _ => print_outcome_text(&outcome),
    }

    Ok(outcome)
}

fn print_outcome_text(outcome: &CheckOutcome) {
    let verdict = if outcome.allowed {
        "ALLOWED".green().bold()
    } else {
        "DENIED".red().bold()
    };
    println!("{} ({})", verdict, outcome.status);
    if let Some(reason) = &outcome.reason {
        println!("  {}: {}", "Reason".bold(), reason.cyan());
    }
    if let Some(project_id) = outcome.project_id {
        println!("  {}: {}", "Project".bold(), project_id);
    }
    println!("  {}", outcome.message);
}
