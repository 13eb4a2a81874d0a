// crates/query-shield-core/src/runtime/index.rs
// ============================================================================
// Module: Query Shield Whitelist Index
// Description: Content-addressed index of whitelist entries.
// Purpose: Provide unique-by-text, unique-by-name entry storage with a longest cache.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The index stores each whitelist entry once in an id-addressed arena and
//! maintains two key views over it: normalized text to entry id and entry
//! name to entry id. A cached longest length tracks the maximum normalized
//! text size so transports can size read buffers. Exact-match sorted maps
//! stand in for a prefix tree; lookup behavior is identical.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::identifiers::QueryId;
use crate::core::query::QueryRecord;

// ============================================================================
// SECTION: Whitelist Index
// ============================================================================

/// Id-addressed arena of whitelist entries with text and name views.
///
/// # Invariants
/// - Every view key resolves to an arena entry and vice versa.
/// - `longest` equals the maximum normalized text length over all entries
///   (0 when empty).
#[derive(Debug, Clone, Default)]
pub struct WhitelistIndex {
    /// Entry arena keyed by entry identifier.
    records: BTreeMap<QueryId, QueryRecord>,
    /// Normalized text view onto the arena.
    by_text: BTreeMap<Vec<u8>, QueryId>,
    /// Entry name view onto the arena.
    by_name: BTreeMap<String, QueryId>,
    /// Cached maximum normalized text length.
    longest: usize,
}

impl WhitelistIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the cached maximum normalized text length.
    #[must_use]
    pub const fn longest(&self) -> usize {
        self.longest
    }

    /// Returns the entry stored under the given normalized text.
    #[must_use]
    pub fn find_by_text(&self, text: &[u8]) -> Option<&QueryRecord> {
        self.by_text.get(text).and_then(|id| self.records.get(id))
    }

    /// Returns the entry stored under the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&QueryRecord> {
        self.by_name.get(name).and_then(|id| self.records.get(id))
    }

    /// Returns whether an entry identifier is already taken.
    #[must_use]
    pub fn contains_id(&self, id: &QueryId) -> bool {
        self.records.contains_key(id)
    }

    /// Verifies that an entry's id, name, and text are all unused.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] naming the conflicting entry on collision.
    pub fn ensure_available(&self, record: &QueryRecord) -> Result<(), IndexError> {
        if let Some(existing) = self.find_by_name(&record.name) {
            return Err(IndexError::DuplicateName {
                name: record.name.clone(),
                existing_id: existing.id.clone(),
            });
        }
        if let Some(existing) = self.find_by_text(&record.normalized_text) {
            return Err(IndexError::DuplicateText {
                name: record.name.clone(),
                existing_name: existing.name.clone(),
            });
        }
        if self.contains_id(&record.id) {
            return Err(IndexError::DuplicateId(record.id.clone()));
        }
        Ok(())
    }

    /// Inserts an entry into the arena and both views.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the id, name, or text is already taken;
    /// the index is unchanged on error.
    pub fn insert(&mut self, record: QueryRecord) -> Result<(), IndexError> {
        self.ensure_available(&record)?;
        self.by_text.insert(record.normalized_text.clone(), record.id.clone());
        self.by_name.insert(record.name.clone(), record.id.clone());
        self.longest = self.longest.max(record.normalized_text.len());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Removes the entry stored under the given normalized text.
    ///
    /// Absence is not an error; `None` is returned and the index is
    /// unchanged. On removal the longest cache is recomputed when the removed
    /// entry carried the maximum length.
    pub fn remove_by_text(&mut self, text: &[u8]) -> Option<QueryRecord> {
        let id = self.by_text.get(text)?.clone();
        let record = self.records.remove(&id)?;
        self.by_text.remove(text);
        self.by_name.remove(&record.name);
        if record.normalized_text.len() == self.longest {
            self.recompute_longest();
        }
        Some(record)
    }

    /// Iterates over all stored entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &QueryRecord> {
        self.records.values()
    }

    /// Recomputes the longest cache from the arena.
    fn recompute_longest(&mut self) {
        self.longest =
            self.records.values().map(|record| record.normalized_text.len()).max().unwrap_or(0);
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Whitelist index uniqueness errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Entry name collides with a stored entry.
    #[error("name conflict: {name} is already used by entry {existing_id}")]
    DuplicateName {
        /// Name of the rejected entry.
        name: String,
        /// Identifier of the stored entry holding the name.
        existing_id: QueryId,
    },
    /// Normalized text collides with a stored entry.
    #[error("duplicate query: {name} matches existing entry {existing_name}")]
    DuplicateText {
        /// Name of the rejected entry.
        name: String,
        /// Name of the stored entry holding the text.
        existing_name: String,
    },
    /// Entry identifier collides with a stored entry.
    #[error("duplicate query id: {0}")]
    DuplicateId(QueryId),
}
