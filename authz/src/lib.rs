//! Hierarchical multi-tenant authorization engine for Classgate.
//!
//! This crate decides whether a principal (admin, teacher or student) may
//! perform an action on a project, milestone, assessment, submission, team or
//! team member. Most resources are several ownership hops away from the
//! project that carries the facts the policy depends on, so every decision is
//! made in two phases: resolve the ownership chain, then evaluate the policy.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the API layer with an authenticated [`Principal`]
//! 2. **[`Gate`]** validates the id and checks the [`TierGate`]
//! 3. **[`ResourceResolver`]** fetches the resource through the injected
//!    [`ResourceStore`] and walks up to its root project
//! 4. **[`PolicyEvaluator`]** applies the [`RoleMatrix`] and the ownership,
//!    school and enrollment rules
//! 5. **Decision** is returned: [`Authorized`] or an [`AuthzError`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use authz::{
//!     memory::InMemoryStore, Action, Gate, Principal, Project, ReasonCode,
//!     ResourceDescriptor, ResourceKind, Tier,
//! };
//!
//! # tokio_test_block(async {
//! let store = InMemoryStore::new().with(ResourceDescriptor::Project(Project {
//!     id: 1,
//!     teacher_id: 7,
//!     school_id: Some(5),
//!     is_public: false,
//! }));
//! let gate = Gate::new(Arc::new(store));
//!
//! let teacher = Principal::teacher(7, Tier::Free);
//! let authorized = gate
//!     .authorize(Some(&teacher), ResourceKind::Project, "1", Action::Delete, None)
//!     .await
//!     .unwrap();
//! assert_eq!(authorized.decision.reason(), ReasonCode::OwnerMatch);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! # Fail Closed
//!
//! Every uncertain condition denies: an unknown kind has no role table entry,
//! a missing parent reference is a broken chain, a student without an
//! enrollment fact is not enrolled. Store failures are the one exception; they
//! are surfaced as [`AuthzError::Store`] rather than disguised as a deny.

pub mod decision;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod memory;
pub mod policy;
pub mod resolver;
pub mod tier;
pub mod types;

pub use decision::{Decision, ReasonCode};
pub use error::{AuthzError, ResolveError, Result, StoreError};
pub use gate::{Authorized, CustomPredicate, Gate};
pub use matrix::{KindPolicy, RoleMatrix};
pub use policy::PolicyEvaluator;
pub use resolver::{ResolutionMemo, ResourceResolver, ResourceStore, MAX_CHAIN_HOPS};
pub use tier::TierGate;
pub use types::{
    Action, ActionClass, Assessment, Enrollment, Milestone, ParentLink, Principal, Project,
    ResourceDescriptor, ResourceKind, Role, Submission, Team, TeamMember, Tier,
};
