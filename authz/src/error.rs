//! Error types for the authorization engine.
//!
//! # Security Note
//! Error messages must balance providing useful information for debugging while
//! not leaking authorization internals to potential attackers. The transport
//! layer decides how much of an [`AuthzError`] is exposed; this module only
//! guarantees that every failure is classified.

use thiserror::Error;

use crate::decision::ReasonCode;
use crate::types::ResourceKind;

/// Failure reported by a [`crate::resolver::ResourceStore`] implementation.
///
/// A store failure is an infrastructure fault, not evidence of unauthorized
/// access. It must never be turned into a deny.
#[derive(Debug, Clone, Error)]
#[error("Resource store failure: {message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A string could not be parsed into one of the engine's enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {what}: {value:?}")]
pub struct ParseTypeError {
    pub what: &'static str,
    pub value: String,
}

impl ParseTypeError {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}

/// Errors that can occur while resolving a resource's ownership chain.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The requested resource does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: i64 },

    /// The resource exists but one of its ancestors is missing.
    ///
    /// This signals an orphaned row rather than a legitimate absence.
    #[error("{kind} {id} has a broken ownership chain at {missing}")]
    BrokenChain {
        kind: ResourceKind,
        id: i64,
        missing: ResourceKind,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors produced by the [`crate::gate::Gate`].
///
/// Every variant maps to exactly one transport status through
/// [`AuthzError::status_code`].
#[derive(Debug, Clone, Error)]
pub enum AuthzError {
    /// The resource id parameter is not a positive integer.
    #[error("Invalid resource id: {0}")]
    Validation(String),

    /// No authenticated principal was supplied.
    #[error("Authentication required")]
    AuthenticationMissing,

    /// The policy denied the request.
    #[error("Forbidden")]
    Denied { reason: ReasonCode },

    /// The resource is absent, or its ownership chain is broken.
    ///
    /// `reason` is either [`ReasonCode::ResourceNotFound`] or
    /// [`ReasonCode::BrokenChain`].
    #[error("Resource not found")]
    NotFound {
        reason: ReasonCode,
        kind: ResourceKind,
        id: i64,
    },

    /// The store failed while resolving the resource.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthzError {
    pub fn denied(reason: ReasonCode) -> Self {
        AuthzError::Denied { reason }
    }

    /// Status code for a conventional request/response transport.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthzError::Validation(_) => 400,
            AuthzError::AuthenticationMissing => 401,
            AuthzError::Denied { .. } => 403,
            AuthzError::NotFound { .. } => 404,
            AuthzError::Store(_) => 500,
        }
    }

    /// Reason code carried by policy and resolution failures.
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            AuthzError::Denied { reason } | AuthzError::NotFound { reason, .. } => Some(*reason),
            AuthzError::Validation(_)
            | AuthzError::AuthenticationMissing
            | AuthzError::Store(_) => None,
        }
    }
}

impl From<ResolveError> for AuthzError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { kind, id } => AuthzError::NotFound {
                reason: ReasonCode::ResourceNotFound,
                kind,
                id,
            },
            ResolveError::BrokenChain { kind, id, .. } => AuthzError::NotFound {
                reason: ReasonCode::BrokenChain,
                kind,
                id,
            },
            ResolveError::Store(e) => AuthzError::Store(e),
        }
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
