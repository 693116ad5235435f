use authz::Authorized;
use axum::{extract::Path, Extension, Json};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    models::ResourceResponse,
};

/// Read one resource
///
/// GET /api/v1/resources/{kind}/{id}
///
/// The authorization middleware has already resolved the resource and its
/// root project; this handler only renders them.
#[utoipa::path(
    get,
    path = "/api/v1/resources/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Resource collection (projects, milestones, assessments, submissions, teams, team-members)"),
        ("id" = String, Path, description = "Positive integer resource id")
    ),
    responses(
        (status = 200, description = "Resource retrieved", body = ResourceResponse),
        (status = 400, description = "Invalid resource id", body = ApiErrorResponse),
        (status = 401, description = "No principal asserted", body = ApiErrorResponse),
        (status = 403, description = "Access denied", body = ApiErrorResponse),
        (status = 404, description = "Resource not found", body = ApiErrorResponse),
        (status = 500, description = "Resource store failure", body = ApiErrorResponse)
    ),
    tag = "resources"
)]
pub async fn read_resource(
    Path((kind, id)): Path<(String, String)>,
    Extension(authorized): Extension<Authorized>,
) -> ApiResult<Json<ResourceResponse>> {
    debug!("Rendering {} {} for principal {}", kind, id, authorized.principal.id);

    let resource = serde_json::to_value(&authorized.resource)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(ResourceResponse {
        kind: authorized.resource.kind().as_str().to_string(),
        id: authorized.resource.id(),
        resource,
        project_id: authorized.project.id,
        reason: authorized.decision.reason().as_str().to_string(),
    }))
}
