use authz::{Action, AuthzError, Principal, ResourceKind};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::{AuthorizeRequest, AuthorizeResponse, PlatformAuthorizeRequest},
    AppState,
};

fn parse_action(raw: &str) -> Result<Action, ApiError> {
    raw.parse::<Action>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Policy denials are answers, not failures, on the decision endpoints.
fn denial_or_error(err: AuthzError, verbose: bool) -> Response {
    match err {
        AuthzError::Denied { reason } => Json(AuthorizeResponse {
            allowed: false,
            reason: reason.as_str().to_string(),
            project_id: None,
        })
        .into_response(),
        other => ApiError::from(other).into_response_with(verbose),
    }
}

/// Evaluate one resource-scoped action for the calling principal
///
/// POST /api/v1/authorize
#[utoipa::path(
    post,
    path = "/api/v1/authorize",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Decision, allowed or denied", body = AuthorizeResponse),
        (status = 400, description = "Invalid id, kind or action", body = ApiErrorResponse),
        (status = 401, description = "No principal asserted", body = ApiErrorResponse),
        (status = 404, description = "Resource not found", body = ApiErrorResponse),
        (status = 500, description = "Resource store failure", body = ApiErrorResponse)
    ),
    tag = "authorization"
)]
pub async fn authorize(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<AuthorizeRequest>,
) -> Response {
    let verbose = state.verbose_errors();
    let principal = principal.map(|Extension(p)| p);

    let kind = match body.kind.parse::<ResourceKind>() {
        Ok(kind) => kind,
        Err(e) => return ApiError::BadRequest(e.to_string()).into_response_with(verbose),
    };
    let action = match parse_action(&body.action) {
        Ok(action) => action,
        Err(e) => return e.into_response_with(verbose),
    };

    info!("Decision requested: {} on {} {}", action, kind, body.id);

    match state
        .gate
        .authorize(principal.as_ref(), kind, &body.id, action, None)
        .await
    {
        Ok(authorized) => Json(AuthorizeResponse {
            allowed: true,
            reason: authorized.decision.reason().as_str().to_string(),
            project_id: Some(authorized.project.id),
        })
        .into_response(),
        Err(e) => denial_or_error(e, verbose),
    }
}

/// Evaluate a platform action that is not scoped to a resource
///
/// POST /api/v1/authorize/platform
#[utoipa::path(
    post,
    path = "/api/v1/authorize/platform",
    request_body = PlatformAuthorizeRequest,
    responses(
        (status = 200, description = "Decision, allowed or denied", body = AuthorizeResponse),
        (status = 400, description = "Unknown action", body = ApiErrorResponse),
        (status = 401, description = "No principal asserted", body = ApiErrorResponse)
    ),
    tag = "authorization"
)]
pub async fn authorize_platform(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<PlatformAuthorizeRequest>,
) -> Response {
    let verbose = state.verbose_errors();
    let principal = principal.map(|Extension(p)| p);

    let action = match parse_action(&body.action) {
        Ok(action) => action,
        Err(e) => return e.into_response_with(verbose),
    };

    match state.gate.authorize_platform(principal.as_ref(), action) {
        Ok(decision) => Json(AuthorizeResponse {
            allowed: true,
            reason: decision.reason().as_str().to_string(),
            project_id: None,
        })
        .into_response(),
        Err(e) => denial_or_error(e, verbose),
    }
}
