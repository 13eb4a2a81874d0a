// crates/query-shield-core/tests/index.rs
// ============================================================================
// Module: Whitelist Index Tests
// Description: Integration tests for the content-addressed whitelist index.
// Purpose: Verify uniqueness enforcement, removal, and the longest cache.
// ============================================================================

//! Integration tests for the whitelist index.

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

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use query_shield_core::ClientRoleId;
use query_shield_core::IndexError;
use query_shield_core::QueryId;
use query_shield_core::QueryRecord;
use query_shield_core::Timestamp;
use query_shield_core::WhitelistIndex;

fn record(id: &str, name: &str, text: &[u8]) -> QueryRecord {
    QueryRecord {
        id: QueryId::new(id),
        normalized_text: text.to_vec(),
        creation: Timestamp::UNIX_EPOCH,
        name: name.to_owned(),
        parameters: BTreeMap::new(),
        whitelisted_for: BTreeSet::from([ClientRoleId::new(1)]),
    }
}

/// Verifies a fresh index is empty with a zeroed longest cache.
#[test]
fn new_index_is_empty() {
    let index = WhitelistIndex::new();
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
    assert_eq!(index.longest(), 0);
    assert!(index.find_by_text(b"query { a }").is_none());
    assert!(index.find_by_name("users").is_none());
    assert_eq!(index.iter().count(), 0);
}

/// Verifies inserted entries resolve through both views.
#[test]
fn insert_resolves_through_both_views() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-1", "users", b"query { users }")).expect("insert succeeds");

    assert_eq!(index.len(), 1);
    assert!(index.contains_id(&QueryId::new("q-1")));
    assert_eq!(index.longest(), b"query { users }".len());

    let by_text = index.find_by_text(b"query { users }").expect("text view resolves");
    assert_eq!(by_text.name, "users");

    let by_name = index.find_by_name("users").expect("name view resolves");
    assert_eq!(by_name.id, QueryId::new("q-1"));
}

/// Verifies a name collision is rejected and names the stored entry.
#[test]
fn insert_rejects_duplicate_name() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-1", "users", b"query { users }")).expect("insert succeeds");

    let error = index
        .insert(record("q-2", "users", b"query { other }"))
        .expect_err("duplicate name is rejected");
    assert_eq!(
        error,
        IndexError::DuplicateName {
            name: "users".to_owned(),
            existing_id: QueryId::new("q-1"),
        }
    );
    assert_eq!(error.to_string(), "name conflict: users is already used by entry q-1");

    assert_eq!(index.len(), 1);
    assert!(index.find_by_text(b"query { other }").is_none());
}

/// Verifies a normalized text collision is rejected and names both entries.
#[test]
fn insert_rejects_duplicate_text() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-1", "users", b"query { users }")).expect("insert succeeds");

    let error = index
        .insert(record("q-2", "members", b"query { users }"))
        .expect_err("duplicate text is rejected");
    assert_eq!(
        error,
        IndexError::DuplicateText {
            name: "members".to_owned(),
            existing_name: "users".to_owned(),
        }
    );
    assert_eq!(error.to_string(), "duplicate query: members matches existing entry users");

    assert_eq!(index.len(), 1);
    assert!(index.find_by_name("members").is_none());
}

/// Verifies an identifier collision is rejected.
#[test]
fn insert_rejects_duplicate_id() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-1", "users", b"query { users }")).expect("insert succeeds");

    let error = index
        .insert(record("q-1", "members", b"query { members }"))
        .expect_err("duplicate id is rejected");
    assert_eq!(error, IndexError::DuplicateId(QueryId::new("q-1")));
    assert_eq!(error.to_string(), "duplicate query id: q-1");
    assert_eq!(index.len(), 1);
}

/// Verifies removal clears both views and tolerates absent text.
#[test]
fn remove_clears_both_views() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-1", "users", b"query { users }")).expect("insert succeeds");

    let removed = index.remove_by_text(b"query { users }").expect("entry is removed");
    assert_eq!(removed.name, "users");

    assert!(index.is_empty());
    assert!(index.find_by_text(b"query { users }").is_none());
    assert!(index.find_by_name("users").is_none());
    assert!(!index.contains_id(&QueryId::new("q-1")));

    assert!(index.remove_by_text(b"query { users }").is_none());
}

/// Verifies the longest cache tracks insertions and removals.
#[test]
fn longest_cache_follows_membership() {
    let mut index = WhitelistIndex::new();
    let short = b"query { a }".to_vec();
    let long = b"query { a b c d e f }".to_vec();

    index.insert(record("q-1", "short", &short)).expect("insert succeeds");
    assert_eq!(index.longest(), short.len());

    index.insert(record("q-2", "long", &long)).expect("insert succeeds");
    assert_eq!(index.longest(), long.len());

    let _ = index.remove_by_text(&long).expect("entry is removed");
    assert_eq!(index.longest(), short.len());

    let _ = index.remove_by_text(&short).expect("entry is removed");
    assert_eq!(index.longest(), 0);
}

/// Verifies iteration yields entries in identifier order.
#[test]
fn iter_orders_entries_by_id() {
    let mut index = WhitelistIndex::new();
    index.insert(record("q-b", "beta", b"query { b }")).expect("insert succeeds");
    index.insert(record("q-a", "alpha", b"query { a }")).expect("insert succeeds");
    index.insert(record("q-c", "gamma", b"query { c }")).expect("insert succeeds");

    let names: Vec<&str> = index.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

/// Verifies availability checks pass on an empty index.
#[test]
fn ensure_available_accepts_fresh_entry() {
    let index = WhitelistIndex::new();
    index
        .ensure_available(&record("q-1", "users", b"query { users }"))
        .expect("fresh entry is available");
}
