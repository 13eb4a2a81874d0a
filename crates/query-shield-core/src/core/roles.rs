// crates/query-shield-core/src/core/roles.rs
// ============================================================================
// Module: Query Shield Role Registry
// Description: Client role definitions and the validated role registry.
// Purpose: Define canonical roles with uniqueness enforced at construction.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! Client roles are coarse-grained authorization buckets assigned to caller
//! sessions. The registry is built once from a non-empty role list, or
//! replaced wholesale by a validated snapshot restore; there is no incremental
//! add or remove. Whitelist entries reference roles by identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ClientRoleId;

// ============================================================================
// SECTION: Role Types
// ============================================================================

/// Client role definition.
///
/// # Invariants
/// - Identifier and name are unique within a registry; immutable once
///   registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRole {
    /// Role identifier referenced by whitelist entries.
    pub id: ClientRoleId,
    /// Human-readable role name.
    pub name: String,
}

/// Validated, read-mostly set of client roles.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    /// Roles keyed by identifier.
    roles: BTreeMap<ClientRoleId, ClientRole>,
}

impl RoleRegistry {
    /// Builds a registry from a non-empty role list.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::MissingRoles`] when the list is empty and
    /// [`RoleError::DuplicateRoleId`] / [`RoleError::DuplicateRoleName`] on
    /// collision.
    pub fn new(roles: Vec<ClientRole>) -> Result<Self, RoleError> {
        if roles.is_empty() {
            return Err(RoleError::MissingRoles);
        }

        ensure_unique_role_ids(&roles)?;
        ensure_unique_role_names(&roles)?;

        let mut index = BTreeMap::new();
        for role in roles {
            index.insert(role.id, role);
        }
        Ok(Self {
            roles: index,
        })
    }

    /// Returns whether a role identifier is registered.
    #[must_use]
    pub fn contains(&self, id: ClientRoleId) -> bool {
        self.roles.contains_key(&id)
    }

    /// Returns the role registered under an identifier.
    #[must_use]
    pub fn get(&self, id: ClientRoleId) -> Option<&ClientRole> {
        self.roles.get(&id)
    }

    /// Returns the number of registered roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns whether the registry holds no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns an owned copy of all roles in identifier order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ClientRole> {
        self.roles.values().cloned().collect()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Role registry validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// Registry input contained no roles.
    #[error("missing roles")]
    MissingRoles,
    /// Duplicate role identifiers detected.
    #[error("duplicate role id: {0}")]
    DuplicateRoleId(ClientRoleId),
    /// Duplicate role names detected.
    #[error("duplicate role name: {0}")]
    DuplicateRoleName(String),
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Ensures role identifiers are unique within the input list.
fn ensure_unique_role_ids(roles: &[ClientRole]) -> Result<(), RoleError> {
    for (index, role) in roles.iter().enumerate() {
        if roles.iter().skip(index + 1).any(|other| other.id == role.id) {
            return Err(RoleError::DuplicateRoleId(role.id));
        }
    }
    Ok(())
}

/// Ensures role names are unique within the input list.
fn ensure_unique_role_names(roles: &[ClientRole]) -> Result<(), RoleError> {
    for (index, role) in roles.iter().enumerate() {
        if roles.iter().skip(index + 1).any(|other| other.name == role.name) {
            return Err(RoleError::DuplicateRoleName(role.name.clone()));
        }
    }
    Ok(())
}
