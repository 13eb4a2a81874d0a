// crates/query-shield-core/tests/shield.rs
// ============================================================================
// Module: Shield Engine Tests
// Description: Integration tests for whitelisting, checking, and removal.
// Purpose: Verify policy decisions, atomicity, persistence, and audit events.
// ============================================================================

//! Integration tests for the shield engine.

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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use query_shield_core::CheckAuditEvent;
use query_shield_core::CheckOutcome;
use query_shield_core::ClientRole;
use query_shield_core::ClientRoleId;
use query_shield_core::ErrorCode;
use query_shield_core::FixedClock;
use query_shield_core::InMemoryPersistence;
use query_shield_core::IndexError;
use query_shield_core::MutationAction;
use query_shield_core::MutationAuditEvent;
use query_shield_core::NoopAuditSink;
use query_shield_core::NormalizeError;
use query_shield_core::Parameter;
use query_shield_core::PersistError;
use query_shield_core::PersistenceManager;
use query_shield_core::QueryError;
use query_shield_core::QueryId;
use query_shield_core::QueryModel;
use query_shield_core::QuerySpec;
use query_shield_core::RandomIdGenerator;
use query_shield_core::SequenceIdGenerator;
use query_shield_core::SharedPersistenceManager;
use query_shield_core::Shield;
use query_shield_core::ShieldAuditSink;
use query_shield_core::ShieldConfig;
use query_shield_core::ShieldError;
use query_shield_core::ShieldState;
use query_shield_core::SystemClock;
use query_shield_core::Timestamp;
use query_shield_core::WhitelistOption;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

fn role(id: u64, name: &str) -> ClientRole {
    ClientRole {
        id: ClientRoleId::new(id),
        name: name.to_owned(),
    }
}

fn sample_roles() -> Vec<ClientRole> {
    vec![role(1, "guest"), role(2, "member")]
}

fn entry(name: &str, query: &str, roles: &[u64]) -> QuerySpec {
    QuerySpec {
        query: query.to_owned(),
        name: name.to_owned(),
        parameters: BTreeMap::new(),
        whitelisted_for: roles.iter().copied().map(ClientRoleId::new).collect(),
    }
}

fn bounded_entry(
    name: &str,
    query: &str,
    roles: &[u64],
    parameter: &str,
    max_value_length: u32,
) -> QuerySpec {
    let mut spec = entry(name, query, roles);
    spec.parameters.insert(
        parameter.to_owned(),
        Parameter {
            max_value_length,
        },
    );
    spec
}

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(name, value)| ((*name).to_owned(), (*value).to_owned())).collect()
}

fn basic_shield(
    roles: Vec<ClientRole>,
) -> Shield<InMemoryPersistence, SystemClock, RandomIdGenerator> {
    Shield::new(ShieldConfig::default(), None, roles).expect("shield builds")
}

/// Persistence stub whose saves can be switched off mid-test.
#[derive(Default)]
struct ToggleStore {
    fail: AtomicBool,
    inner: InMemoryPersistence,
}

impl ToggleStore {
    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl PersistenceManager for ToggleStore {
    fn load(&self) -> Result<Option<ShieldState>, PersistError> {
        self.inner.load()
    }

    fn save(&self, state: &ShieldState) -> Result<(), PersistError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistError::Io("save disabled".to_owned()));
        }
        self.inner.save(state)
    }
}

/// Audit sink retaining the interesting fields of every event.
#[derive(Default)]
struct RecordingSink {
    checks: Mutex<Vec<(CheckOutcome, Option<&'static str>)>>,
    mutations: Mutex<Vec<(MutationAction, Vec<String>, bool, Option<&'static str>)>>,
}

impl RecordingSink {
    fn checks(&self) -> Vec<(CheckOutcome, Option<&'static str>)> {
        self.checks.lock().expect("sink lock").clone()
    }

    fn mutations(&self) -> Vec<(MutationAction, Vec<String>, bool, Option<&'static str>)> {
        self.mutations.lock().expect("sink lock").clone()
    }
}

impl ShieldAuditSink for RecordingSink {
    fn record_check(&self, event: &CheckAuditEvent) {
        self.checks.lock().expect("sink lock").push((event.outcome, event.error_kind));
    }

    fn record_mutation(&self, event: &MutationAuditEvent) {
        self.mutations.lock().expect("sink lock").push((
            event.action,
            event.entries.clone(),
            event.committed,
            event.error_kind,
        ));
    }
}

// ============================================================================
// SECTION: Whitelist and Check
// ============================================================================

/// Verifies whitelisting returns records with fresh ids and creation stamps.
#[test]
fn whitelist_returns_complete_records() {
    let shield = Shield::with_dependencies(
        ShieldConfig::default(),
        None::<InMemoryPersistence>,
        sample_roles(),
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::new(NoopAuditSink),
    )
    .expect("shield builds");

    let records = shield
        .whitelist(vec![entry("listUsers", "query { users { id } }", &[1, 2])])
        .expect("whitelist succeeds");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, QueryId::new("query-1"));
    assert_eq!(record.name, "listUsers");
    assert_eq!(record.normalized_text, b"query { users { id } }".to_vec());
    assert_eq!(record.creation, Timestamp::UNIX_EPOCH);
    assert!(record.whitelisted_for.contains(&ClientRoleId::new(1)));
    assert!(record.whitelisted_for.contains(&ClientRoleId::new(2)));
    assert_eq!(shield.entry_count().expect("count reads"), 1);
}

/// Verifies checks match any whitespace variant of a whitelisted query.
#[test]
fn check_allows_spacing_variants() {
    let shield = basic_shield(sample_roles());
    shield
        .whitelist(vec![entry("listUsers", "query { users { id } }", &[1, 2])])
        .expect("whitelist succeeds");

    let compact = shield
        .check(ClientRoleId::new(1), b"query  {  users  {  id  }  }".to_vec(), &BTreeMap::new())
        .expect("variant is allowed");
    assert_eq!(compact, b"query { users { id } }".to_vec());

    let padded = shield
        .check(ClientRoleId::new(2), b"\n\tquery { users { id } }  ".to_vec(), &BTreeMap::new())
        .expect("variant is allowed");
    assert_eq!(padded, compact);
}

/// Verifies an unregistered role fails with the untyped role error.
#[test]
fn check_rejects_undefined_role() {
    let shield = basic_shield(sample_roles());
    shield
        .whitelist(vec![entry("listUsers", "query { users { id } }", &[1, 2])])
        .expect("whitelist succeeds");

    let err = shield
        .check(ClientRoleId::new(3), b"query { users { id } }".to_vec(), &BTreeMap::new())
        .expect_err("unknown role is rejected");
    assert_eq!(err.to_string(), "role 3 is undefined");
    assert_eq!(err.code(), None);
    assert!(matches!(err, ShieldError::UndefinedRole(_)));
}

/// Verifies a query that was never whitelisted is denied.
#[test]
fn check_denies_unknown_query() {
    let shield = basic_shield(sample_roles());

    let err = shield
        .check(ClientRoleId::new(1), b"{ a }".to_vec(), &BTreeMap::new())
        .expect_err("unknown query is denied");
    assert_eq!(err.to_string(), "query not whitelisted");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(matches!(err, ShieldError::QueryNotWhitelisted));
}

/// Verifies a role outside the entry's whitelist is denied.
#[test]
fn check_denies_unlisted_role() {
    let shield = basic_shield(sample_roles());
    shield.whitelist(vec![entry("listUsers", "{ users }", &[1])]).expect("whitelist succeeds");

    let err = shield
        .check(ClientRoleId::new(2), b"{ users }".to_vec(), &BTreeMap::new())
        .expect_err("unlisted role is denied");
    assert_eq!(err.to_string(), "role not allowed");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(matches!(err, ShieldError::RoleNotAllowed));
}

/// Verifies argument count, presence, and length bounds are enforced.
#[test]
fn check_enforces_argument_bounds() {
    let shield = basic_shield(sample_roles());
    shield
        .whitelist(vec![bounded_entry(
            "findUser",
            "query ($name: String!) { user }",
            &[1],
            "name",
            5,
        )])
        .expect("whitelist succeeds");
    let query = b"query ($name: String!) { user }".to_vec();

    let err = shield
        .check(ClientRoleId::new(1), query.clone(), &BTreeMap::new())
        .expect_err("zero arguments are rejected");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(matches!(
        err,
        ShieldError::ArgumentCountMismatch {
            expected: 1,
            actual: 0,
        }
    ));

    let err = shield
        .check(
            ClientRoleId::new(1),
            query.clone(),
            &args(&[("name", "abc"), ("extra", "x")]),
        )
        .expect_err("surplus arguments are rejected");
    assert!(matches!(
        err,
        ShieldError::ArgumentCountMismatch {
            expected: 1,
            actual: 2,
        }
    ));

    let err = shield
        .check(ClientRoleId::new(1), query.clone(), &args(&[("other", "abc")]))
        .expect_err("misnamed argument is rejected");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(matches!(err, ShieldError::MissingArgument(name) if name == "name"));

    let err = shield
        .check(ClientRoleId::new(1), query.clone(), &args(&[("name", "abcdef")]))
        .expect_err("oversized argument is rejected");
    assert_eq!(err.to_string(), "argument name exceeds max value length 5");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));

    shield
        .check(ClientRoleId::new(1), query, &args(&[("name", "abcde")]))
        .expect("argument at the bound is allowed");
}

/// Verifies malformed query text fails with the wrong-input code.
#[test]
fn check_rejects_malformed_query_text() {
    let shield = basic_shield(sample_roles());

    let err = shield
        .check(ClientRoleId::new(1), Vec::new(), &BTreeMap::new())
        .expect_err("empty input is rejected");
    assert_eq!(err.code(), Some(ErrorCode::WrongInput));
    assert!(matches!(err, ShieldError::Normalize(NormalizeError::EmptyQuery)));

    let err = shield
        .check(ClientRoleId::new(1), b"{ a(b: \"open }".to_vec(), &BTreeMap::new())
        .expect_err("unclosed literal is rejected");
    assert_eq!(err.code(), Some(ErrorCode::WrongInput));
    assert!(matches!(err, ShieldError::Normalize(NormalizeError::UnclosedString)));
}

/// Verifies disabled enforcement passes normalized queries through.
#[test]
fn disabled_shield_passes_queries_through() {
    let config = ShieldConfig {
        option: WhitelistOption::Disabled,
    };
    let shield: Shield<InMemoryPersistence, _, _> =
        Shield::new(config, None, sample_roles()).expect("shield builds");

    let normalized = shield
        .check(ClientRoleId::new(9), b"  query   {  a }  ".to_vec(), &BTreeMap::new())
        .expect("pass-through returns normalized bytes");
    assert_eq!(normalized, b"query { a }".to_vec());

    let err = shield
        .check(ClientRoleId::new(9), Vec::new(), &BTreeMap::new())
        .expect_err("pass-through still normalizes");
    assert_eq!(err.code(), Some(ErrorCode::WrongInput));
}

// ============================================================================
// SECTION: Whitelist Validation and Conflicts
// ============================================================================

/// Verifies structurally invalid candidates are rejected off-lock.
#[test]
fn whitelist_rejects_invalid_candidates() {
    let shield = basic_shield(sample_roles());

    let err = shield
        .whitelist(vec![entry("", "{ a }", &[1])])
        .expect_err("empty name is rejected");
    assert_eq!(err.code(), Some(ErrorCode::WrongInput));
    assert!(matches!(err, ShieldError::Query(QueryError::MissingName)));

    let err = shield
        .whitelist(vec![entry("blank", "   \t  ", &[1])])
        .expect_err("whitespace-only text is rejected");
    assert_eq!(err.code(), Some(ErrorCode::WrongInput));
    assert!(
        matches!(err, ShieldError::Query(QueryError::MissingQueryText(name)) if name == "blank")
    );

    let err = shield
        .whitelist(vec![entry("orphan", "{ a }", &[])])
        .expect_err("empty role list is rejected");
    assert!(matches!(err, ShieldError::Query(QueryError::MissingWhitelistedRoles(_))));

    let err = shield
        .whitelist(vec![entry("twice", "{ a }", &[1, 1])])
        .expect_err("repeated role is rejected");
    assert!(matches!(err, ShieldError::Query(QueryError::DuplicateWhitelistedRole(_, _))));

    let err = shield
        .whitelist(vec![bounded_entry("loose", "{ a }", &[1], "", 3)])
        .expect_err("empty parameter name is rejected");
    assert!(matches!(err, ShieldError::Query(QueryError::MissingParameterName(_))));

    let err = shield
        .whitelist(vec![bounded_entry("zero", "{ a }", &[1], "name", 0)])
        .expect_err("zero bound is rejected");
    assert!(matches!(err, ShieldError::Query(QueryError::InvalidMaxValueLength(_, _))));

    assert_eq!(shield.entry_count().expect("count reads"), 0);
}

/// Verifies candidates referencing unknown roles are rejected.
#[test]
fn whitelist_rejects_undefined_role_reference() {
    let shield = basic_shield(sample_roles());

    let err = shield
        .whitelist(vec![entry("listUsers", "{ users }", &[1, 9])])
        .expect_err("unknown role reference is rejected");
    assert_eq!(err.to_string(), "role 9 is undefined");
    assert_eq!(err.code(), None);
    assert_eq!(shield.entry_count().expect("count reads"), 0);
}

/// Verifies name and normalized text conflicts name the stored entry.
#[test]
fn whitelist_rejects_conflicts_with_stored_entries() {
    let shield = Shield::with_dependencies(
        ShieldConfig::default(),
        None::<InMemoryPersistence>,
        sample_roles(),
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::new(NoopAuditSink),
    )
    .expect("shield builds");
    shield.whitelist(vec![entry("users", "{ users }", &[1])]).expect("whitelist succeeds");

    let err = shield
        .whitelist(vec![entry("users", "{ members }", &[1])])
        .expect_err("name reuse is rejected");
    assert_eq!(err.to_string(), "name conflict: users is already used by entry query-1");
    assert!(matches!(err, ShieldError::Index(IndexError::DuplicateName { .. })));

    let err = shield
        .whitelist(vec![entry("members", "{   users   }", &[1])])
        .expect_err("equivalent text is rejected");
    assert_eq!(err.to_string(), "duplicate query: members matches existing entry users");
    assert!(matches!(err, ShieldError::Index(IndexError::DuplicateText { .. })));

    assert_eq!(shield.entry_count().expect("count reads"), 1);
}

/// Verifies a batch with internal conflicts commits nothing.
#[test]
fn whitelist_batch_is_all_or_nothing() {
    let shield = basic_shield(sample_roles());

    let err = shield
        .whitelist(vec![
            entry("first", "{ a }", &[1]),
            entry("second", "{   a   }", &[1]),
        ])
        .expect_err("in-batch duplicate text is rejected");
    assert!(matches!(err, ShieldError::Index(IndexError::DuplicateText { .. })));
    assert_eq!(shield.entry_count().expect("count reads"), 0);

    let err = shield
        .whitelist(vec![
            entry("twin", "{ a }", &[1]),
            entry("twin", "{ b }", &[1]),
        ])
        .expect_err("in-batch duplicate name is rejected");
    assert!(matches!(err, ShieldError::Index(IndexError::DuplicateName { .. })));
    assert_eq!(shield.entry_count().expect("count reads"), 0);

    let records = shield.whitelist(Vec::new()).expect("empty batch is a no-op");
    assert!(records.is_empty());
    assert_eq!(shield.entry_count().expect("count reads"), 0);
}

// ============================================================================
// SECTION: Removal and Listing
// ============================================================================

/// Verifies removal is idempotent and restores denial of the removed query.
#[test]
fn remove_is_idempotent_and_restores_denial() {
    let shield = basic_shield(sample_roles());
    let records = shield
        .whitelist(vec![
            entry("long", "{ a b c d e f g }", &[1]),
            entry("short", "{ a }", &[1]),
        ])
        .expect("whitelist succeeds");
    assert_eq!(shield.longest_query_len().expect("longest reads"), b"{ a b c d e f g }".len());

    let long = records.iter().find(|record| record.name == "long").expect("long entry exists");
    shield.remove(long).expect("removal succeeds");
    assert_eq!(shield.entry_count().expect("count reads"), 1);
    assert_eq!(shield.longest_query_len().expect("longest reads"), b"{ a }".len());

    let err = shield
        .check(ClientRoleId::new(1), b"{ a b c d e f g }".to_vec(), &BTreeMap::new())
        .expect_err("removed query is denied");
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));

    shield.remove(long).expect("repeat removal is a no-op");
    assert_eq!(shield.entry_count().expect("count reads"), 1);
}

/// Verifies listings are keyed by name and detached from internal state.
#[test]
fn list_returns_detached_copies() {
    let shield = basic_shield(sample_roles());
    shield
        .whitelist(vec![bounded_entry("findUser", "{ user }", &[1], "name", 5)])
        .expect("whitelist succeeds");

    let mut listing = shield.list().expect("listing succeeds");
    assert_eq!(listing.len(), 1);
    let copy = listing.get_mut("findUser").expect("entry is listed");
    copy.whitelisted_for.clear();
    copy.parameters.clear();
    copy.normalized_text.clear();

    shield
        .check(ClientRoleId::new(1), b"{ user }".to_vec(), &args(&[("name", "abc")]))
        .expect("internal state is unaffected by listing mutation");
}

// ============================================================================
// SECTION: Persistence and Restore
// ============================================================================

/// Verifies mutations persist snapshots that later constructions restore.
#[test]
fn snapshot_round_trips_through_persistence() {
    let store = InMemoryPersistence::new();
    let first = Shield::with_dependencies(
        ShieldConfig::default(),
        Some(store.clone()),
        sample_roles(),
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::new(NoopAuditSink),
    )
    .expect("shield builds");
    first
        .whitelist(vec![bounded_entry("findUser", "{  user  }", &[1], "name", 5)])
        .expect("whitelist succeeds");
    drop(first);

    let second: Shield<InMemoryPersistence, _, _> =
        Shield::new(ShieldConfig::default(), Some(store), vec![role(9, "placeholder")])
            .expect("shield restores");

    let roles = second.roles().expect("roles read");
    assert_eq!(roles, sample_roles());

    let listing = second.list().expect("listing succeeds");
    let restored = listing.get("findUser").expect("entry is restored");
    assert_eq!(restored.id, QueryId::new("query-1"));
    assert_eq!(restored.creation, Timestamp::UNIX_EPOCH);
    assert_eq!(restored.normalized_text, b"{ user }".to_vec());

    second
        .check(ClientRoleId::new(1), b"{ user }".to_vec(), &args(&[("name", "abc")]))
        .expect("restored entry is enforced");
}

/// Verifies a snapshot referencing an unknown role aborts construction.
#[test]
fn construction_rejects_snapshot_with_unknown_role() {
    let model = QueryModel {
        query: "{ a }".to_owned(),
        creation: Timestamp::UNIX_EPOCH,
        name: "a".to_owned(),
        parameters: BTreeMap::new(),
        whitelisted_for: vec![ClientRoleId::new(5)],
    };
    let state = ShieldState {
        roles: vec![role(1, "guest")],
        queries: BTreeMap::from([(QueryId::new("q-1"), model)]),
    };

    let err = Shield::new(
        ShieldConfig::default(),
        Some(InMemoryPersistence::with_state(state)),
        sample_roles(),
    )
    .expect_err("restore fails validation");
    assert_eq!(err.to_string(), "role 5 is undefined");
}

/// Verifies snapshot entries with equivalent text abort construction.
#[test]
fn construction_rejects_snapshot_with_duplicate_text() {
    let first = QueryModel {
        query: "{ a }".to_owned(),
        creation: Timestamp::UNIX_EPOCH,
        name: "first".to_owned(),
        parameters: BTreeMap::new(),
        whitelisted_for: vec![ClientRoleId::new(1)],
    };
    let second = QueryModel {
        query: "{   a   }".to_owned(),
        creation: Timestamp::UNIX_EPOCH,
        name: "second".to_owned(),
        parameters: BTreeMap::new(),
        whitelisted_for: vec![ClientRoleId::new(1)],
    };
    let state = ShieldState {
        roles: vec![role(1, "guest")],
        queries: BTreeMap::from([
            (QueryId::new("q-1"), first),
            (QueryId::new("q-2"), second),
        ]),
    };

    let err = Shield::new(
        ShieldConfig::default(),
        Some(InMemoryPersistence::with_state(state)),
        sample_roles(),
    )
    .expect_err("restore fails validation");
    assert!(matches!(err, ShieldError::Index(IndexError::DuplicateText { .. })));
}

/// Verifies the engine renders a field-level debug view without the sink.
#[test]
fn shield_debug_render_names_guarded_state() {
    let shield = basic_shield(sample_roles());

    let rendered = format!("{shield:?}");
    assert!(rendered.starts_with("Shield"));
    assert!(rendered.contains("inner"));
    assert!(rendered.contains("option"));
    assert!(rendered.contains(".."));
}

/// Verifies a failed save rolls the whitelist batch back in memory.
#[test]
fn failed_save_rolls_back_whitelist() {
    let store = Arc::new(ToggleStore::default());
    let manager = SharedPersistenceManager::new(store.clone());
    let shield = Shield::new(ShieldConfig::default(), Some(manager), sample_roles())
        .expect("shield builds");

    store.set_fail(true);
    let err = shield
        .whitelist(vec![entry("users", "{ users }", &[1])])
        .expect_err("failed save aborts the batch");
    assert_eq!(err.code(), None);
    assert!(matches!(err, ShieldError::Persist(_)));
    assert_eq!(shield.entry_count().expect("count reads"), 0);

    store.set_fail(false);
    shield.whitelist(vec![entry("users", "{ users }", &[1])]).expect("retry succeeds");
    assert_eq!(shield.entry_count().expect("count reads"), 1);
}

/// Verifies a failed save reinserts a removed entry.
#[test]
fn failed_save_rolls_back_remove() {
    let store = Arc::new(ToggleStore::default());
    let manager = SharedPersistenceManager::new(store.clone());
    let shield = Shield::new(ShieldConfig::default(), Some(manager), sample_roles())
        .expect("shield builds");
    let records = shield.whitelist(vec![entry("users", "{ users }", &[1])]).expect("whitelist");

    store.set_fail(true);
    let err = shield.remove(&records[0]).expect_err("failed save aborts removal");
    assert!(matches!(err, ShieldError::Persist(_)));
    assert_eq!(shield.entry_count().expect("count reads"), 1);
    shield
        .check(ClientRoleId::new(1), b"{ users }".to_vec(), &BTreeMap::new())
        .expect("rolled-back entry is still enforced");

    store.set_fail(false);
    shield.remove(&records[0]).expect("retry succeeds");
    assert_eq!(shield.entry_count().expect("count reads"), 0);
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Verifies check and mutation outcomes reach the audit sink.
#[test]
fn audit_sink_receives_operation_events() {
    let sink = Arc::new(RecordingSink::default());
    let shield = Shield::with_dependencies(
        ShieldConfig::default(),
        None::<InMemoryPersistence>,
        sample_roles(),
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::clone(&sink) as Arc<dyn ShieldAuditSink>,
    )
    .expect("shield builds");

    let records = shield.whitelist(vec![entry("users", "{ users }", &[1])]).expect("whitelist");
    let _ = shield.check(ClientRoleId::new(1), b"{ users }".to_vec(), &BTreeMap::new());
    let _ = shield.check(ClientRoleId::new(1), b"{ other }".to_vec(), &BTreeMap::new());
    let _ = shield.check(ClientRoleId::new(7), b"{ users }".to_vec(), &BTreeMap::new());
    let _ = shield.whitelist(vec![entry("users", "{ second }", &[1])]);
    shield.remove(&records[0]).expect("removal succeeds");

    let checks = sink.checks();
    assert_eq!(checks.len(), 3);
    assert_eq!(checks[0], (CheckOutcome::Allowed, None));
    assert_eq!(checks[1], (CheckOutcome::Denied, Some("query_not_whitelisted")));
    assert_eq!(checks[2], (CheckOutcome::Error, Some("undefined_role")));

    let mutations = sink.mutations();
    assert_eq!(mutations.len(), 3);
    assert_eq!(
        mutations[0],
        (MutationAction::Whitelist, vec!["users".to_owned()], true, None)
    );
    assert_eq!(
        mutations[1],
        (MutationAction::Whitelist, vec!["users".to_owned()], false, Some("name_conflict"))
    );
    assert_eq!(mutations[2], (MutationAction::Remove, vec!["users".to_owned()], true, None));
}

/// Verifies snapshot restore emits a committed mutation event.
#[test]
fn audit_sink_receives_restore_event() {
    let store = InMemoryPersistence::new();
    let seed: Shield<InMemoryPersistence, _, _> =
        Shield::new(ShieldConfig::default(), Some(store.clone()), sample_roles())
            .expect("shield builds");
    seed.whitelist(vec![entry("users", "{ users }", &[1])]).expect("whitelist succeeds");
    drop(seed);

    let sink = Arc::new(RecordingSink::default());
    let _restored = Shield::with_dependencies(
        ShieldConfig::default(),
        Some(store),
        sample_roles(),
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::clone(&sink) as Arc<dyn ShieldAuditSink>,
    )
    .expect("shield restores");

    let mutations = sink.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0], (MutationAction::Restore, vec!["users".to_owned()], true, None));
}
