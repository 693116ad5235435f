use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A resource that passed authorization, with its root project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceResponse {
    pub kind: String,
    pub id: i64,
    /// The resource row, tagged with its `kind`
    #[schema(value_type = Object)]
    pub resource: serde_json::Value,
    pub project_id: i64,
    /// Reason code of the allow decision
    pub reason: String,
}

/// Request to evaluate one resource-scoped action
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeRequest {
    /// Resource kind, singular (`team_member`) or collection (`team-members`) form
    pub kind: String,
    /// Raw resource id, validated as a positive integer
    pub id: String,
    pub action: String,
}

/// Request to evaluate a platform action
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlatformAuthorizeRequest {
    pub action: String,
}

/// Outcome of a decision endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}
