// crates/query-shield-core/src/interfaces/mod.rs
// ============================================================================
// Module: Query Shield Interfaces
// Description: Backend-agnostic interfaces for persistence, time, and ids.
// Purpose: Define the contract surfaces used by the shield runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the shield integrates with external systems without
//! embedding backend-specific details. Implementations must be deterministic
//! where possible and fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::QueryId;
use crate::core::state::ShieldState;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Persistence Manager
// ============================================================================

/// Persistence manager errors.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Persistence I/O error.
    #[error("persistence io error: {0}")]
    Io(String),
    /// Persisted data is corrupted or fails integrity checks.
    #[error("persistence corruption: {0}")]
    Corrupt(String),
    /// Persisted data is invalid.
    #[error("persistence invalid data: {0}")]
    Invalid(String),
    /// Persistence backend reported an error.
    #[error("persistence error: {0}")]
    Store(String),
}

/// Snapshot persistence for shield state.
///
/// Implementations load and save the full snapshot on every call; there is no
/// incremental write path, no timeout, and no cancellation.
pub trait PersistenceManager {
    /// Loads the persisted snapshot, or `None` when no snapshot exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when loading fails.
    fn load(&self) -> Result<Option<ShieldState>, PersistError>;

    /// Saves the full snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when saving fails.
    fn save(&self, state: &ShieldState) -> Result<(), PersistError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source for entry creation timestamps.
///
/// The shield never reads wall-clock time directly; hosts inject a clock so
/// tests can supply deterministic values.
pub trait Clock {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Id Generator
// ============================================================================

/// Identifier source for new whitelist entries.
///
/// Generated identifiers are expected to be unique per shield instance;
/// collisions are rejected at insertion time.
pub trait IdGenerator {
    /// Returns a fresh entry identifier.
    fn next_id(&self) -> QueryId;
}
