//! Principal extraction.
//!
//! Classgate sits behind an authentication proxy that validates the session
//! and asserts the caller's identity in request headers. This module turns
//! those headers into an [`authz::Principal`] request extension.
//!
//! # Security Notes
//!
//! - The headers must be stripped from client traffic by the proxy; this
//!   service trusts them as given
//! - A request without `x-principal-id` is anonymous and reaches the gate
//!   without a principal, which answers `401`
//! - Malformed identity headers are rejected here with `401`

use authz::{Principal, Role, Tier};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";
pub const PRINCIPAL_TIER_HEADER: &str = "x-principal-tier";
pub const PRINCIPAL_SCHOOL_HEADER: &str = "x-principal-school-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| ApiError::InvalidPrincipal(format!("{} is not valid text", name))),
    }
}

/// Build the principal asserted by the request headers.
///
/// Returns `Ok(None)` for anonymous requests. The tier defaults to `free`
/// when the header is absent.
pub fn extract_principal(headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    let Some(raw_id) = header(headers, PRINCIPAL_ID_HEADER)? else {
        return Ok(None);
    };

    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::InvalidPrincipal(format!("bad principal id {:?}", raw_id)))?;

    let role: Role = header(headers, PRINCIPAL_ROLE_HEADER)?
        .ok_or_else(|| ApiError::InvalidPrincipal("missing principal role".to_string()))?
        .parse::<Role>()
        .map_err(|e| ApiError::InvalidPrincipal(e.to_string()))?;

    let tier: Tier = match header(headers, PRINCIPAL_TIER_HEADER)? {
        Some(raw) => raw
            .parse::<Tier>()
            .map_err(|e| ApiError::InvalidPrincipal(e.to_string()))?,
        None => Tier::Free,
    };

    let mut principal = Principal::new(id, role, tier);
    if let Some(raw) = header(headers, PRINCIPAL_SCHOOL_HEADER)? {
        let school_id: i64 = raw
            .parse()
            .map_err(|_| ApiError::InvalidPrincipal(format!("bad school id {:?}", raw)))?;
        principal = principal.with_school(school_id);
    }

    Ok(Some(principal))
}

/// Authentication middleware
///
/// Attaches the asserted [`Principal`] to the request extensions. Anonymous
/// requests pass through untouched.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_principal(request.headers()) {
        Ok(Some(principal)) => {
            debug!(
                "AUTH: {} {} (tier {}) on {}",
                principal.role,
                principal.id,
                principal.tier,
                request.uri()
            );
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Ok(None) => {
            debug!("AUTH: anonymous request to {}", request.uri());
            next.run(request).await
        }
        Err(e) => {
            warn!("AUTH: rejected request to {}: {}", request.uri(), e);
            e.into_response_with(state.verbose_errors())
        }
    }
}
