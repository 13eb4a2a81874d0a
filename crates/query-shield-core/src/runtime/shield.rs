// crates/query-shield-core/src/runtime/shield.rs
// ============================================================================
// Module: Query Shield Engine
// Description: Role-scoped query whitelisting, checking, and removal.
// Purpose: Enforce whitelist membership and argument bounds under one lock.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde, thiserror
// ============================================================================

//! ## Overview
//! The shield gates which query documents a client may execute. Mutators
//! validate candidates off-lock, then take the exclusive lock to verify
//! uniqueness and commit, persisting synchronously while the lock is held.
//! Checks take the shared lock, normalize the query, and verify whitelist
//! membership, role authorization, and argument bounds. On persistence
//! failure, in-memory state is rolled back so memory and disk never diverge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use serde::Deserialize;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::ClientRoleId;
use crate::core::identifiers::QueryId;
use crate::core::normalize::NormalizeError;
use crate::core::normalize::normalize;
use crate::core::query::QueryError;
use crate::core::query::QueryRecord;
use crate::core::query::QuerySpec;
use crate::core::roles::ClientRole;
use crate::core::roles::RoleError;
use crate::core::roles::RoleRegistry;
use crate::core::state::QueryModel;
use crate::core::state::ShieldState;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::IdGenerator;
use crate::interfaces::PersistError;
use crate::interfaces::PersistenceManager;
use crate::runtime::audit::CheckAuditEvent;
use crate::runtime::audit::CheckAuditEventParams;
use crate::runtime::audit::CheckOutcome;
use crate::runtime::audit::MutationAction;
use crate::runtime::audit::MutationAuditEvent;
use crate::runtime::audit::MutationAuditEventParams;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::ShieldAuditSink;
use crate::runtime::index::IndexError;
use crate::runtime::index::WhitelistIndex;
use crate::runtime::sources::RandomIdGenerator;
use crate::runtime::sources::SystemClock;

// ============================================================================
// SECTION: Shield Configuration
// ============================================================================

/// Whitelist enforcement mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistOption {
    /// Enforce whitelist membership on every check.
    #[default]
    Enabled,
    /// Pass queries through after normalization only.
    Disabled,
}

/// Configuration for the shield engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShieldConfig {
    /// Whitelist enforcement mode.
    pub option: WhitelistOption,
}

// ============================================================================
// SECTION: Shield Engine
// ============================================================================

/// State guarded as one unit by the shield lock.
#[derive(Debug)]
struct ShieldInner {
    /// Validated role registry.
    roles: RoleRegistry,
    /// Content-addressed whitelist index.
    index: WhitelistIndex,
}

/// Query whitelist firewall gating role-scoped query execution.
pub struct Shield<P, C, G> {
    /// Role registry and whitelist index guarded as one unit.
    inner: RwLock<ShieldInner>,
    /// Optional snapshot persistence.
    persistence: Option<P>,
    /// Time source for entry creation stamps.
    clock: C,
    /// Identifier source for new entries.
    ids: G,
    /// Whitelist enforcement mode.
    option: WhitelistOption,
    /// Audit sink receiving check and mutation events.
    audit: Arc<dyn ShieldAuditSink>,
}

impl<P, C, G> std::fmt::Debug for Shield<P, C, G>
where
    P: std::fmt::Debug,
    C: std::fmt::Debug,
    G: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shield")
            .field("inner", &self.inner)
            .field("persistence", &self.persistence)
            .field("clock", &self.clock)
            .field("ids", &self.ids)
            .field("option", &self.option)
            .finish_non_exhaustive()
    }
}

impl<P> Shield<P, SystemClock, RandomIdGenerator>
where
    P: PersistenceManager,
{
    /// Creates a shield with system time, random entry ids, and no audit.
    ///
    /// Roles are validated first; when persistence is configured and holds a
    /// snapshot, the snapshot replaces the given roles and entries wholesale
    /// after full re-validation.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError`] when the role list is invalid, the snapshot
    /// fails to load, or snapshot restore fails validation.
    pub fn new(
        config: ShieldConfig,
        persistence: Option<P>,
        roles: Vec<ClientRole>,
    ) -> Result<Self, ShieldError> {
        Self::with_dependencies(
            config,
            persistence,
            roles,
            SystemClock,
            RandomIdGenerator::new(),
            Arc::new(NoopAuditSink),
        )
    }
}

impl<P, C, G> Shield<P, C, G>
where
    P: PersistenceManager,
    C: Clock,
    G: IdGenerator,
{
    /// Creates a shield with explicit clock, id, and audit dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError`] when the role list is invalid, the snapshot
    /// fails to load, or snapshot restore fails validation.
    pub fn with_dependencies(
        config: ShieldConfig,
        persistence: Option<P>,
        roles: Vec<ClientRole>,
        clock: C,
        ids: G,
        audit: Arc<dyn ShieldAuditSink>,
    ) -> Result<Self, ShieldError> {
        let registry = RoleRegistry::new(roles)?;
        let mut inner = ShieldInner {
            roles: registry,
            index: WhitelistIndex::new(),
        };

        if let Some(manager) = &persistence
            && let Some(state) = manager.load()?
        {
            let entry_names: Vec<String> =
                state.queries.values().map(|model| model.name.clone()).collect();
            match restore_parts(state) {
                Ok(restored) => {
                    inner = restored;
                    audit.record_mutation(&MutationAuditEvent::new(MutationAuditEventParams {
                        action: MutationAction::Restore,
                        entries: entry_names,
                        committed: true,
                        error_kind: None,
                    }));
                }
                Err(err) => {
                    audit.record_mutation(&MutationAuditEvent::new(MutationAuditEventParams {
                        action: MutationAction::Restore,
                        entries: entry_names,
                        committed: false,
                        error_kind: Some(err.kind()),
                    }));
                    return Err(err);
                }
            }
        }

        Ok(Self {
            inner: RwLock::new(inner),
            persistence,
            clock,
            ids,
            option: config.option,
            audit,
        })
    }

    /// Checks a query for a role, returning the normalized bytes on success.
    ///
    /// Takes buffer ownership and normalizes it in place; callers needing the
    /// original bytes must copy first. Never mutates shield state and never
    /// touches persistence. When whitelisting is disabled, returns the
    /// normalized bytes with no further checks.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError`] with code `WrongInput` on normalization
    /// failures, `Unauthorized` on whitelist, role, or argument denials, and
    /// without a code when the role is undefined or the lock is poisoned.
    pub fn check(
        &self,
        role_id: ClientRoleId,
        query: Vec<u8>,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ShieldError> {
        let result = self.check_inner(role_id, query, arguments);
        let (outcome, error_kind) = match &result {
            Ok(_) => (CheckOutcome::Allowed, None),
            Err(err) if matches!(err.code(), Some(ErrorCode::Unauthorized)) => {
                (CheckOutcome::Denied, Some(err.kind()))
            }
            Err(err) => (CheckOutcome::Error, Some(err.kind())),
        };
        let (query_digest, normalized_len) = match &result {
            Ok(bytes) => (Some(hash_bytes(DEFAULT_HASH_ALGORITHM, bytes)), Some(bytes.len())),
            Err(_) => (None, None),
        };
        self.audit.record_check(&CheckAuditEvent::new(CheckAuditEventParams {
            role_id,
            outcome,
            error_kind,
            query_digest,
            normalized_len,
        }));
        result
    }

    /// Runs the check pipeline without emitting audit events.
    fn check_inner(
        &self,
        role_id: ClientRoleId,
        mut query: Vec<u8>,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ShieldError> {
        normalize(&mut query)?;
        if self.option == WhitelistOption::Disabled {
            return Ok(query);
        }

        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        if !inner.roles.contains(role_id) {
            return Err(ShieldError::UndefinedRole(role_id));
        }
        let Some(record) = inner.index.find_by_text(&query) else {
            return Err(ShieldError::QueryNotWhitelisted);
        };
        if !record.whitelisted_for.contains(&role_id) {
            return Err(ShieldError::RoleNotAllowed);
        }
        if arguments.len() != record.parameters.len() {
            return Err(ShieldError::ArgumentCountMismatch {
                expected: record.parameters.len(),
                actual: arguments.len(),
            });
        }
        for (name, parameter) in &record.parameters {
            let Some(value) = arguments.get(name) else {
                return Err(ShieldError::MissingArgument(name.clone()));
            };
            let limit = usize::try_from(parameter.max_value_length).unwrap_or(usize::MAX);
            if value.len() > limit {
                return Err(ShieldError::ArgumentTooLong {
                    name: name.clone(),
                    max_value_length: parameter.max_value_length,
                });
            }
        }
        drop(inner);
        Ok(query)
    }

    /// Whitelists a batch of candidate entries as one atomic operation.
    ///
    /// Candidates are structurally validated and normalized off-lock, then
    /// verified against the registry, the index, and each other under the
    /// exclusive lock before any insertion. The batch commits as a whole: on
    /// persistence failure every entry inserted by this call is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError`] with code `WrongInput` on malformed
    /// candidates, and without a code on undefined roles, name or text
    /// conflicts, persistence failure, or a poisoned lock.
    pub fn whitelist(&self, entries: Vec<QuerySpec>) -> Result<Vec<QueryRecord>, ShieldError> {
        let names: Vec<String> = entries.iter().map(|spec| spec.name.clone()).collect();
        let result = self.whitelist_inner(entries);
        self.audit_mutation(MutationAction::Whitelist, names, result.as_ref().err());
        result
    }

    /// Runs the whitelist pipeline without emitting audit events.
    fn whitelist_inner(&self, entries: Vec<QuerySpec>) -> Result<Vec<QueryRecord>, ShieldError> {
        let mut prepared = Vec::with_capacity(entries.len());
        for spec in entries {
            prepared.push(prepare_candidate(spec, self.ids.next_id(), self.clock.now())?);
        }
        if prepared.is_empty() {
            return Ok(prepared);
        }

        let mut inner = self.inner.write().map_err(|_| ShieldError::LockPoisoned)?;
        for (position, record) in prepared.iter().enumerate() {
            for role_id in &record.whitelisted_for {
                if !inner.roles.contains(*role_id) {
                    return Err(ShieldError::UndefinedRole(*role_id));
                }
            }
            inner.index.ensure_available(record)?;
            ensure_batch_distinct(record, &prepared[.. position])?;
        }

        for (position, record) in prepared.iter().enumerate() {
            if let Err(err) = inner.index.insert(record.clone()) {
                rollback_inserted(&mut inner.index, &prepared[.. position]);
                return Err(err.into());
            }
        }

        if let Some(manager) = &self.persistence {
            let state = capture_parts(&inner);
            if let Err(err) = manager.save(&state) {
                rollback_inserted(&mut inner.index, &prepared);
                return Err(err.into());
            }
        }
        drop(inner);
        Ok(prepared)
    }

    /// Removes a previously issued entry; absence is a successful no-op.
    ///
    /// Deletion keys on the entry's normalized text. When the removed entry
    /// carried the longest text, the longest cache is recomputed. On
    /// persistence failure the entry is reinserted and the error returned.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError`] on persistence failure or a poisoned lock.
    pub fn remove(&self, record: &QueryRecord) -> Result<(), ShieldError> {
        let names = vec![record.name.clone()];
        let result = self.remove_inner(record);
        self.audit_mutation(MutationAction::Remove, names, result.as_ref().err());
        result
    }

    /// Runs the removal pipeline without emitting audit events.
    fn remove_inner(&self, record: &QueryRecord) -> Result<(), ShieldError> {
        let mut inner = self.inner.write().map_err(|_| ShieldError::LockPoisoned)?;
        let Some(removed) = inner.index.remove_by_text(&record.normalized_text) else {
            return Ok(());
        };
        if let Some(manager) = &self.persistence {
            let state = capture_parts(&inner);
            if let Err(err) = manager.save(&state) {
                let _ = inner.index.insert(removed);
                return Err(err.into());
            }
        }
        drop(inner);
        Ok(())
    }

    /// Lists all entries keyed by name.
    ///
    /// Every returned record is an independent deep copy; callers cannot
    /// reach internal state through the result.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::LockPoisoned`] when the lock is poisoned.
    pub fn list(&self) -> Result<BTreeMap<String, QueryRecord>, ShieldError> {
        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        Ok(inner.index.iter().map(|record| (record.name.clone(), record.clone())).collect())
    }

    /// Captures the serializable snapshot of roles and entries.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::LockPoisoned`] when the lock is poisoned.
    pub fn capture_state(&self) -> Result<ShieldState, ShieldError> {
        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        Ok(capture_parts(&inner))
    }

    /// Returns the number of whitelisted entries.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::LockPoisoned`] when the lock is poisoned.
    pub fn entry_count(&self) -> Result<usize, ShieldError> {
        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        Ok(inner.index.len())
    }

    /// Returns the longest normalized query length across all entries.
    ///
    /// Transports use this to size read buffers; 0 when no entries exist.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::LockPoisoned`] when the lock is poisoned.
    pub fn longest_query_len(&self) -> Result<usize, ShieldError> {
        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        Ok(inner.index.longest())
    }

    /// Returns an owned copy of the registered roles in identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::LockPoisoned`] when the lock is poisoned.
    pub fn roles(&self) -> Result<Vec<ClientRole>, ShieldError> {
        let inner = self.inner.read().map_err(|_| ShieldError::LockPoisoned)?;
        Ok(inner.roles.snapshot())
    }

    /// Emits a mutation audit event for one operation result.
    fn audit_mutation(
        &self,
        action: MutationAction,
        entries: Vec<String>,
        error: Option<&ShieldError>,
    ) {
        self.audit.record_mutation(&MutationAuditEvent::new(MutationAuditEventParams {
            action,
            entries,
            committed: error.is_none(),
            error_kind: error.map(ShieldError::kind),
        }));
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Stable error codes for the typed error tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Whitelist, role, or argument denial.
    Unauthorized,
    /// Malformed or empty query input.
    WrongInput,
}

impl ErrorCode {
    /// Returns a stable label for this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::WrongInput => "wrong_input",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shield operation errors.
///
/// Errors carrying a [`code`](Self::code) form the typed taxonomy callers
/// branch on; errors without a code signal configuration or integrity
/// failures that abort the operation or construction.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// Caller presented a role the registry does not know.
    #[error("role {0} is undefined")]
    UndefinedRole(ClientRoleId),
    /// Normalized text is not whitelisted.
    #[error("query not whitelisted")]
    QueryNotWhitelisted,
    /// Entry exists but does not list the caller's role.
    #[error("role not allowed")]
    RoleNotAllowed,
    /// Argument count differs from the declared parameter count.
    #[error("expected {expected} arguments, received {actual}")]
    ArgumentCountMismatch {
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },
    /// Declared parameter has no matching argument.
    #[error("missing argument: {0}")]
    MissingArgument(String),
    /// Argument value exceeds its declared bound.
    #[error("argument {name} exceeds max value length {max_value_length}")]
    ArgumentTooLong {
        /// Argument name.
        name: String,
        /// Declared maximum value length in bytes.
        max_value_length: u32,
    },
    /// Shield lock was poisoned by a panicking holder.
    #[error("shield lock poisoned")]
    LockPoisoned,
    /// Query normalization failed.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    /// Candidate entry failed structural validation.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Role registry validation failed.
    #[error(transparent)]
    Role(#[from] RoleError),
    /// Whitelist index uniqueness violated.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Persistence manager failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ShieldError {
    /// Returns the stable code for typed errors, `None` for untyped ones.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::QueryNotWhitelisted
            | Self::RoleNotAllowed
            | Self::ArgumentCountMismatch { .. }
            | Self::MissingArgument(_)
            | Self::ArgumentTooLong { .. } => Some(ErrorCode::Unauthorized),
            Self::Normalize(_) | Self::Query(_) => Some(ErrorCode::WrongInput),
            Self::UndefinedRole(_)
            | Self::LockPoisoned
            | Self::Role(_)
            | Self::Index(_)
            | Self::Persist(_) => None,
        }
    }

    /// Returns a stable kind label for audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UndefinedRole(_) => "undefined_role",
            Self::QueryNotWhitelisted => "query_not_whitelisted",
            Self::RoleNotAllowed => "role_not_allowed",
            Self::ArgumentCountMismatch { .. } => "argument_count_mismatch",
            Self::MissingArgument(_) => "missing_argument",
            Self::ArgumentTooLong { .. } => "argument_too_long",
            Self::LockPoisoned => "lock_poisoned",
            Self::Normalize(NormalizeError::EmptyQuery) => "empty_query",
            Self::Normalize(NormalizeError::UnclosedString) => "unclosed_string",
            Self::Query(_) => "invalid_query_spec",
            Self::Role(_) => "invalid_roles",
            Self::Index(IndexError::DuplicateName { .. }) => "name_conflict",
            Self::Index(IndexError::DuplicateText { .. }) => "duplicate_query",
            Self::Index(IndexError::DuplicateId(_)) => "duplicate_query_id",
            Self::Persist(_) => "persistence",
        }
    }
}

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

/// Validates a candidate and builds its immutable record.
fn prepare_candidate(
    spec: QuerySpec,
    id: QueryId,
    creation: Timestamp,
) -> Result<QueryRecord, ShieldError> {
    spec.validate()?;
    let QuerySpec {
        query,
        name,
        parameters,
        whitelisted_for,
    } = spec;
    let mut normalized_text = query.into_bytes();
    normalize(&mut normalized_text)?;
    if normalized_text.is_empty() {
        return Err(QueryError::MissingQueryText(name).into());
    }
    Ok(QueryRecord {
        id,
        normalized_text,
        creation,
        name,
        parameters,
        whitelisted_for: whitelisted_for.into_iter().collect(),
    })
}

/// Ensures a candidate does not collide with earlier candidates in the batch.
fn ensure_batch_distinct(record: &QueryRecord, earlier: &[QueryRecord]) -> Result<(), ShieldError> {
    for other in earlier {
        if other.name == record.name {
            return Err(IndexError::DuplicateName {
                name: record.name.clone(),
                existing_id: other.id.clone(),
            }
            .into());
        }
        if other.normalized_text == record.normalized_text {
            return Err(IndexError::DuplicateText {
                name: record.name.clone(),
                existing_name: other.name.clone(),
            }
            .into());
        }
        if other.id == record.id {
            return Err(IndexError::DuplicateId(record.id.clone()).into());
        }
    }
    Ok(())
}

/// Removes the given records from the index after a failed commit.
fn rollback_inserted(index: &mut WhitelistIndex, records: &[QueryRecord]) {
    for record in records {
        let _ = index.remove_by_text(&record.normalized_text);
    }
}

/// Produces the serializable snapshot of roles and entries.
fn capture_parts(inner: &ShieldInner) -> ShieldState {
    ShieldState {
        roles: inner.roles.snapshot(),
        queries: inner
            .index
            .iter()
            .map(|record| (record.id.clone(), QueryModel::from_record(record)))
            .collect(),
    }
}

/// Rebuilds registry and index structures from a persisted snapshot.
///
/// The snapshot is fully re-validated into fresh, detached structures: role
/// uniqueness, per-entry structure, referential integrity against the
/// snapshot's own roles, and text, name, and id uniqueness. Entry text is
/// re-normalized, so the longest cache is consistent by construction.
fn restore_parts(state: ShieldState) -> Result<ShieldInner, ShieldError> {
    let registry = RoleRegistry::new(state.roles)?;
    let mut index = WhitelistIndex::new();
    for (id, model) in state.queries {
        let creation = model.creation;
        let spec = QuerySpec {
            query: model.query,
            name: model.name,
            parameters: model.parameters,
            whitelisted_for: model.whitelisted_for,
        };
        let record = prepare_candidate(spec, id, creation)?;
        for role_id in &record.whitelisted_for {
            if !registry.contains(*role_id) {
                return Err(ShieldError::UndefinedRole(*role_id));
            }
        }
        index.insert(record)?;
    }
    Ok(ShieldInner {
        roles: registry,
        index,
    })
}
