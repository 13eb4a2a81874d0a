// crates/query-shield-core/src/runtime/audit.rs
// ============================================================================
// Module: Shield Audit Logging
// Description: Structured audit events for shield checks and mutations.
// Purpose: Emit redacted audit logs without hard dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for shield operations.
//! Query text never appears in events; documents are referenced by content
//! digest. It is intentionally lightweight so deployments can route events to
//! their preferred logging pipeline without redesign.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::ClientRoleId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for a shield check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Query passed all checks.
    Allowed,
    /// Query was denied by whitelist or argument policy.
    Denied,
    /// Check failed outside the policy taxonomy.
    Error,
}

/// Mutation kind recorded in audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    /// Batch whitelist call.
    Whitelist,
    /// Single entry removal.
    Remove,
    /// Snapshot restore at construction.
    Restore,
}

/// Shield check audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct CheckAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Role identifier presented by the caller.
    pub role_id: ClientRoleId,
    /// Check outcome.
    pub outcome: CheckOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Content digest of the normalized query (never the text).
    pub query_digest: Option<HashDigest>,
    /// Normalized query length in bytes.
    pub normalized_len: Option<usize>,
}

/// Shield mutation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct MutationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Mutation kind.
    pub action: MutationAction,
    /// Names of the affected entries.
    pub entries: Vec<String>,
    /// Whether the mutation committed.
    pub committed: bool,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a check audit event.
pub struct CheckAuditEventParams {
    /// Role identifier presented by the caller.
    pub role_id: ClientRoleId,
    /// Check outcome.
    pub outcome: CheckOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Content digest of the normalized query (never the text).
    pub query_digest: Option<HashDigest>,
    /// Normalized query length in bytes.
    pub normalized_len: Option<usize>,
}

/// Inputs required to construct a mutation audit event.
pub struct MutationAuditEventParams {
    /// Mutation kind.
    pub action: MutationAction,
    /// Names of the affected entries.
    pub entries: Vec<String>,
    /// Whether the mutation committed.
    pub committed: bool,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl CheckAuditEvent {
    /// Creates a new check audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: CheckAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "shield_check",
            timestamp_ms,
            role_id: params.role_id,
            outcome: params.outcome,
            error_kind: params.error_kind,
            query_digest: params.query_digest,
            normalized_len: params.normalized_len,
        }
    }
}

impl MutationAuditEvent {
    /// Creates a new mutation audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: MutationAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "shield_mutation",
            timestamp_ms,
            action: params.action,
            entries: params.entries,
            committed: params.committed,
            error_kind: params.error_kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for shield events.
pub trait ShieldAuditSink: Send + Sync {
    /// Record a check audit event.
    fn record_check(&self, event: &CheckAuditEvent);

    /// Record a mutation audit event.
    fn record_mutation(&self, _event: &MutationAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ShieldAuditSink for StderrAuditSink {
    fn record_check(&self, event: &CheckAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_mutation(&self, event: &MutationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ShieldAuditSink for FileAuditSink {
    fn record_check(&self, event: &CheckAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }

    fn record_mutation(&self, event: &MutationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl ShieldAuditSink for NoopAuditSink {
    fn record_check(&self, _event: &CheckAuditEvent) {}

    fn record_mutation(&self, _event: &MutationAuditEvent) {}
}
