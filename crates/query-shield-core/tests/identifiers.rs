// crates/query-shield-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Integration tests for role and whitelist entry identifiers.
// Purpose: Verify display, ordering, and transparent wire encoding.
// ============================================================================

//! Integration tests for the canonical identifier types.

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

use query_shield_core::ClientRoleId;
use query_shield_core::QueryId;

/// Verifies role identifiers expose their raw value and display as numbers.
#[test]
fn client_role_id_displays_raw_value() {
    let id = ClientRoleId::new(7);
    assert_eq!(id.get(), 7);
    assert_eq!(id.to_string(), "7");
    assert_eq!(ClientRoleId::from(7), id);
}

/// Verifies role identifiers order by numeric value.
#[test]
fn client_role_id_orders_numerically() {
    let mut ids = vec![ClientRoleId::new(10), ClientRoleId::new(2), ClientRoleId::new(7)];
    ids.sort();
    let raw: Vec<u64> = ids.iter().map(|id| id.get()).collect();
    assert_eq!(raw, vec![2, 7, 10]);
}

/// Verifies role identifiers serialize as bare numbers.
#[test]
fn client_role_id_serializes_transparently() {
    let encoded = serde_json::to_string(&ClientRoleId::new(42)).expect("encodes");
    assert_eq!(encoded, "42");

    let decoded: ClientRoleId = serde_json::from_str("42").expect("decodes");
    assert_eq!(decoded, ClientRoleId::new(42));
}

/// Verifies entry identifiers expose string access and display forms.
#[test]
fn query_id_displays_raw_string() {
    let id = QueryId::new("abc-123");
    assert_eq!(id.as_str(), "abc-123");
    assert_eq!(id.to_string(), "abc-123");
    assert_eq!(QueryId::from("abc-123"), id);
    assert_eq!(QueryId::from("abc-123".to_owned()), id);
}

/// Verifies entry identifiers serialize as bare strings.
#[test]
fn query_id_serializes_transparently() {
    let encoded = serde_json::to_string(&QueryId::new("q-1")).expect("encodes");
    assert_eq!(encoded, "\"q-1\"");

    let decoded: QueryId = serde_json::from_str("\"q-1\"").expect("decodes");
    assert_eq!(decoded, QueryId::new("q-1"));
}
