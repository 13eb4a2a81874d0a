// crates/query-shield-core/src/runtime/authz.rs
// ============================================================================
// Module: Session Authorization Rules
// Description: Ownership-style access rules composed with the shield role check.
// Purpose: Provide a closed rule set dispatched through one authorize function.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The shield answers "may this role run this query"; hosts additionally
//! apply ownership-style rules to the surrounding request (for example "is
//! the caller the resource owner"). Rules form a small closed set of tagged
//! variants evaluated by [`authorize`]; there is no open-ended dynamic
//! dispatch. Deny reasons are stable labels for audit logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::ClientRoleId;

// ============================================================================
// SECTION: Session Model
// ============================================================================

/// Caller session facts available to access rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Role assigned to the session.
    pub client_role_id: ClientRoleId,
    /// Authenticated user identifier, absent for anonymous sessions.
    pub user_id: Option<String>,
}

// ============================================================================
// SECTION: Access Rules
// ============================================================================

/// Closed set of access rules evaluated outside the shield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Permit when the session role is one of the listed roles.
    AnyRole {
        /// Roles accepted by the rule.
        role_ids: Vec<ClientRoleId>,
    },
    /// Permit when the session user owns the resource.
    ResourceOwner {
        /// User identifier owning the resource.
        owner_id: String,
    },
}

/// Access rule decision outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is permitted.
    Permit,
    /// Access is denied.
    Deny {
        /// Reason label for audit logs.
        reason: String,
    },
}

impl AccessDecision {
    /// Returns whether the decision permits access.
    #[must_use]
    pub const fn is_permit(&self) -> bool {
        matches!(self, Self::Permit)
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates one access rule against a session.
#[must_use]
pub fn authorize(session: &Session, rule: &AccessRule) -> AccessDecision {
    match rule {
        AccessRule::AnyRole {
            role_ids,
        } => {
            if role_ids.contains(&session.client_role_id) {
                AccessDecision::Permit
            } else {
                AccessDecision::Deny {
                    reason: "role_not_listed".to_string(),
                }
            }
        }
        AccessRule::ResourceOwner {
            owner_id,
        } => match session.user_id.as_deref() {
            Some(user_id) if user_id == owner_id => AccessDecision::Permit,
            Some(_) => AccessDecision::Deny {
                reason: "not_resource_owner".to_string(),
            },
            None => AccessDecision::Deny {
                reason: "anonymous_session".to_string(),
            },
        },
    }
}
