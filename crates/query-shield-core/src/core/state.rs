// crates/query-shield-core/src/core/state.rs
// ============================================================================
// Module: Query Shield Persisted State
// Description: Serializable snapshot of roles and whitelist entries.
// Purpose: Define the stable wire form used by persistence managers.
// Dependencies: crate::core::{identifiers, query, roles, time}, serde
// ============================================================================

//! ## Overview
//! The persisted state is the complete representation of roles and whitelist
//! entries, used to reconstruct the shield after a restart. Entries are stored
//! as raw text and re-normalized on restore, so a snapshot edited by hand with
//! loose formatting still restores to canonical form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ClientRoleId;
use crate::core::identifiers::QueryId;
use crate::core::query::Parameter;
use crate::core::query::QueryRecord;
use crate::core::roles::ClientRole;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Snapshot Types
// ============================================================================

/// Serializable projection of one whitelist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryModel {
    /// Raw query text; re-normalized on restore.
    pub query: String,
    /// Creation timestamp.
    pub creation: Timestamp,
    /// Unique entry name.
    pub name: String,
    /// Declared argument bounds keyed by argument name.
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    /// Role identifiers allowed to execute the entry.
    #[serde(rename = "whitelisted-for")]
    pub whitelisted_for: Vec<ClientRoleId>,
}

impl QueryModel {
    /// Projects a stored record into its serializable form.
    #[must_use]
    pub fn from_record(record: &QueryRecord) -> Self {
        Self {
            query: String::from_utf8_lossy(&record.normalized_text).into_owned(),
            creation: record.creation,
            name: record.name.clone(),
            parameters: record.parameters.clone(),
            whitelisted_for: record.whitelisted_for.iter().copied().collect(),
        }
    }
}

/// Complete persisted snapshot of the shield.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldState {
    /// Registered client roles.
    pub roles: Vec<ClientRole>,
    /// Whitelist entries keyed by entry identifier.
    #[serde(rename = "whitelisted-queries")]
    pub queries: BTreeMap<QueryId, QueryModel>,
}

impl ShieldState {
    /// Returns whether the snapshot carries no roles and no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.queries.is_empty()
    }
}
