// crates/query-shield-core/tests/authz.rs
// ============================================================================
// Module: Session Authorization Tests
// Description: Integration tests for session access rule evaluation.
// Purpose: Verify permit and deny outcomes with stable deny reasons.
// ============================================================================

//! Integration tests for session access rules.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use query_shield_core::AccessDecision;
use query_shield_core::AccessRule;
use query_shield_core::ClientRoleId;
use query_shield_core::Session;
use query_shield_core::authorize;

fn session(role_id: u64, user_id: Option<&str>) -> Session {
    Session {
        client_role_id: ClientRoleId::new(role_id),
        user_id: user_id.map(str::to_owned),
    }
}

/// Verifies role rules permit listed roles and deny the rest.
#[test]
fn any_role_rule_matches_listed_roles() {
    let rule = AccessRule::AnyRole {
        role_ids: vec![ClientRoleId::new(1), ClientRoleId::new(2)],
    };

    assert!(authorize(&session(2, None), &rule).is_permit());

    let decision = authorize(&session(3, None), &rule);
    assert!(!decision.is_permit());
    assert_eq!(
        decision,
        AccessDecision::Deny {
            reason: "role_not_listed".to_owned(),
        }
    );
}

/// Verifies ownership rules compare the session user to the owner.
#[test]
fn resource_owner_rule_requires_matching_user() {
    let rule = AccessRule::ResourceOwner {
        owner_id: "user-7".to_owned(),
    };

    assert!(authorize(&session(1, Some("user-7")), &rule).is_permit());

    let decision = authorize(&session(1, Some("user-8")), &rule);
    assert_eq!(
        decision,
        AccessDecision::Deny {
            reason: "not_resource_owner".to_owned(),
        }
    );
}

/// Verifies anonymous sessions are denied ownership access.
#[test]
fn resource_owner_rule_denies_anonymous_sessions() {
    let rule = AccessRule::ResourceOwner {
        owner_id: "user-7".to_owned(),
    };

    let decision = authorize(&session(1, None), &rule);
    assert_eq!(
        decision,
        AccessDecision::Deny {
            reason: "anonymous_session".to_owned(),
        }
    );
}
