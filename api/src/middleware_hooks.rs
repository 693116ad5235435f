use authz::{Action, Principal, ResourceKind};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// Response header naming the reason code of an allowed request
pub const AUTHZ_REASON_HEADER: &str = "x-authz-reason";

/// Authorization middleware
///
/// Runs the [`authz::Gate`] for resource routes of the form
/// `/resources/{kind}/{id}` and attaches the resulting [`authz::Authorized`]
/// to the request extensions, so handlers get the resolved resource and its
/// project without fetching again.
///
/// # Authorization Flow
///
/// 1. Take the [`Principal`] attached by [`crate::auth::authenticate`], if any
/// 2. Extract the Action from the HTTP method
/// 3. Extract the resource kind and raw id from the URI path
/// 4. Call [`authz::Gate::authorize`]; any error becomes the response
///
/// # Security Notes
///
/// - Deny-by-default: an unmapped method or kind never reaches a handler
/// - Error bodies only carry reason codes outside production
pub async fn authorization_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let verbose = state.verbose_errors();

    info!("AUTHZ MIDDLEWARE: Processing {} request to {}", method, uri);

    let principal = request.extensions().get::<Principal>().cloned();

    let Some(action) = extract_action_from_method(&method) else {
        return ApiError::BadRequest(format!("Unsupported method {}", method))
            .into_response_with(verbose);
    };

    let Some((kind_segment, raw_id)) = extract_resource_from_path(uri.path()) else {
        return ApiError::BadRequest(format!("No resource in path {}", uri.path()))
            .into_response_with(verbose);
    };

    let kind: ResourceKind = match kind_segment.parse() {
        Ok(kind) => kind,
        Err(_) => return ApiError::UnknownResourceKind(kind_segment).into_response_with(verbose),
    };

    debug!(
        "AUTHZ MIDDLEWARE: Checking principal={:?}, action={}, kind={}, id={}",
        principal, action, kind, raw_id
    );

    match state
        .gate
        .authorize(principal.as_ref(), kind, &raw_id, action, None)
        .await
    {
        Ok(authorized) => {
            let reason = authorized.decision.reason();
            request.extensions_mut().insert(authorized);

            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(AUTHZ_REASON_HEADER, HeaderValue::from_static(reason.as_str()));
            response
        }
        Err(e) => {
            info!(
                "AUTHZ MIDDLEWARE: {} {} rejected with status {}",
                method,
                uri,
                e.status_code()
            );
            ApiError::from(e).into_response_with(verbose)
        }
    }
}

/// Extract action from HTTP method
///
/// Resource routes are read-only, so only GET and HEAD map to an action.
pub fn extract_action_from_method(method: &Method) -> Option<Action> {
    match method.as_str() {
        "GET" | "HEAD" => Some(Action::Read),
        _ => None,
    }
}

/// Extract the resource kind segment and the raw id from a URI path
///
/// Looks for `.../resources/{kind}/{id}`. The id is returned unparsed so the
/// gate can validate it.
pub fn extract_resource_from_path(path: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let position = segments.iter().position(|segment| *segment == "resources")?;
    match segments.get(position + 1..position + 3) {
        Some([kind, id]) => Some((kind.to_string(), id.to_string())),
        _ => None,
    }
}

/// Request processing middleware hook
/// This runs before authentication to log and time incoming requests
pub async fn request_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!(
        "REQUEST MIDDLEWARE: Processing incoming {} request to {}",
        method, uri
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    debug!(
        "REQUEST MIDDLEWARE: {} {} answered {} in {:?}",
        method,
        uri,
        response.status(),
        duration
    );

    response
}

/// Response processing middleware hook
/// This runs before sending the response to add service headers
pub async fn response_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "x-classgate-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    // Decisions depend on live ownership data
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    debug!("RESPONSE MIDDLEWARE: Response postprocessing complete");

    response
}
