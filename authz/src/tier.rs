//! Subscription tier requirements per action.
//!
//! Some features are unavailable below a tier regardless of who owns the
//! resource. The gate consults this table before touching the store, so a
//! request for a paid feature from a free account fails without a fetch.
//!
//! Every action has an explicit entry, including the ones with no requirement.

use crate::types::{Action, Principal, Tier};

#[derive(Debug, Clone, Copy, Default)]
pub struct TierGate;

impl TierGate {
    pub fn new() -> Self {
        Self
    }

    /// Minimum tier needed to attempt `action`, if any.
    pub fn requires_tier(&self, action: Action) -> Option<Tier> {
        match action {
            Action::ViewAnalytics => Some(Tier::Enterprise),
            Action::ManageTeam => Some(Tier::Enterprise),
            Action::Read
            | Action::Create
            | Action::Update
            | Action::Delete
            | Action::ToggleVisibility
            | Action::Submit => None,
            // User management under /admin has no tier requirement.
            Action::ManageUsers => None,
        }
    }

    /// Whether `principal`'s tier satisfies the requirement for `action`.
    pub fn admits(&self, principal: &Principal, action: Action) -> bool {
        match self.requires_tier(action) {
            Some(required) => principal.tier.satisfies(required),
            None => true,
        }
    }
}
