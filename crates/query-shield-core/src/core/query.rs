// crates/query-shield-core/src/core/query.rs
// ============================================================================
// Module: Query Shield Whitelist Entries
// Description: Candidate query specifications and stored whitelist records.
// Purpose: Define canonical entry types with structural validation helpers.
// Dependencies: crate::core::{identifiers, time}, serde, thiserror
// ============================================================================

//! ## Overview
//! A whitelist entry is an approved, role-scoped query document stored by its
//! normalized content. Callers author a `QuerySpec` (raw text plus policy
//! metadata); the shield turns accepted candidates into immutable
//! `QueryRecord`s. Records are never edited in place; replacement is remove
//! plus re-add.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ClientRoleId;
use crate::core::identifiers::QueryId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Parameter Bounds
// ============================================================================

/// Length bound declared for one query argument.
///
/// # Invariants
/// - `max_value_length` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Maximum accepted argument value length in bytes.
    #[serde(rename = "max-value-length")]
    pub max_value_length: u32,
}

// ============================================================================
// SECTION: Candidate Specifications
// ============================================================================

/// Candidate whitelist entry authored by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Raw query text; normalized before indexing.
    pub query: String,
    /// Unique entry name.
    pub name: String,
    /// Declared argument bounds keyed by argument name.
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    /// Role identifiers allowed to execute the entry.
    pub whitelisted_for: Vec<ClientRoleId>,
}

impl QuerySpec {
    /// Validates the candidate's structure before any index interaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the name or query text is empty, no roles
    /// are listed, a role is repeated, or a parameter is malformed.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.name.trim().is_empty() {
            return Err(QueryError::MissingName);
        }
        if self.query.trim().is_empty() {
            return Err(QueryError::MissingQueryText(self.name.clone()));
        }
        if self.whitelisted_for.is_empty() {
            return Err(QueryError::MissingWhitelistedRoles(self.name.clone()));
        }
        ensure_unique_whitelisted_roles(&self.name, &self.whitelisted_for)?;
        ensure_parameters_well_formed(&self.name, &self.parameters)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Stored Records
// ============================================================================

/// Whitelist entry stored by the shield.
///
/// # Invariants
/// - `normalized_text` is non-empty and unique across the index.
/// - `name` and `id` are unique across the index.
/// - `whitelisted_for` is non-empty and references registered roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    /// Entry identifier assigned at insertion time.
    pub id: QueryId,
    /// Normalized query document bytes.
    pub normalized_text: Vec<u8>,
    /// Creation timestamp.
    pub creation: Timestamp,
    /// Unique entry name.
    pub name: String,
    /// Declared argument bounds keyed by argument name.
    pub parameters: BTreeMap<String, Parameter>,
    /// Role identifiers allowed to execute the entry.
    pub whitelisted_for: BTreeSet<ClientRoleId>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Candidate entry validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Candidate name is empty.
    #[error("query name is empty")]
    MissingName,
    /// Candidate text normalized to nothing.
    #[error("query {0} has empty text")]
    MissingQueryText(String),
    /// Candidate lists no roles.
    #[error("query {0} whitelists no roles")]
    MissingWhitelistedRoles(String),
    /// Candidate repeats a role identifier.
    #[error("query {0} repeats role {1}")]
    DuplicateWhitelistedRole(String, ClientRoleId),
    /// Candidate declares a parameter with an empty name.
    #[error("query {0} declares a parameter with an empty name")]
    MissingParameterName(String),
    /// Candidate declares a parameter bound below one byte.
    #[error("query {0} parameter {1} must allow at least one byte")]
    InvalidMaxValueLength(String, String),
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Ensures the whitelisted role list contains no repeats.
fn ensure_unique_whitelisted_roles(
    name: &str,
    roles: &[ClientRoleId],
) -> Result<(), QueryError> {
    for (index, role) in roles.iter().enumerate() {
        if roles.iter().skip(index + 1).any(|other| other == role) {
            return Err(QueryError::DuplicateWhitelistedRole(name.to_string(), *role));
        }
    }
    Ok(())
}

/// Ensures declared parameters carry usable names and bounds.
fn ensure_parameters_well_formed(
    name: &str,
    parameters: &BTreeMap<String, Parameter>,
) -> Result<(), QueryError> {
    for (parameter_name, parameter) in parameters {
        if parameter_name.trim().is_empty() {
            return Err(QueryError::MissingParameterName(name.to_string()));
        }
        if parameter.max_value_length < 1 {
            return Err(QueryError::InvalidMaxValueLength(
                name.to_string(),
                parameter_name.clone(),
            ));
        }
    }
    Ok(())
}
