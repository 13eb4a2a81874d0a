// crates/query-shield-core/src/runtime/store.rs
// ============================================================================
// Module: Query Shield In-Memory Persistence
// Description: Simple in-memory persistence manager for tests and demos.
// Purpose: Provide a deterministic persistence implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`PersistenceManager`] for tests and local demos. It is not intended for
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::state::ShieldState;
use crate::interfaces::PersistError;
use crate::interfaces::PersistenceManager;

// ============================================================================
// SECTION: In-Memory Persistence
// ============================================================================

/// In-memory persistence manager for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPersistence {
    /// Stored snapshot protected by a mutex.
    state: Arc<Mutex<Option<ShieldState>>>,
}

impl InMemoryPersistence {
    /// Creates an empty in-memory persistence manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a manager pre-seeded with a snapshot.
    #[must_use]
    pub fn with_state(state: ShieldState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
        }
    }
}

impl PersistenceManager for InMemoryPersistence {
    fn load(&self) -> Result<Option<ShieldState>, PersistError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| PersistError::Store("persistence mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &ShieldState) -> Result<(), PersistError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| PersistError::Store("persistence mutex poisoned".to_string()))?;
        *guard = Some(state.clone());
        drop(guard);
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Persistence Wrapper
// ============================================================================

/// Shared persistence manager backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedPersistenceManager {
    /// Inner persistence implementation.
    inner: Arc<dyn PersistenceManager + Send + Sync>,
}

impl SharedPersistenceManager {
    /// Wraps a persistence manager in a shared, clonable wrapper.
    #[must_use]
    pub fn from_manager(manager: impl PersistenceManager + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(manager),
        }
    }

    /// Wraps an existing shared manager.
    #[must_use]
    pub const fn new(manager: Arc<dyn PersistenceManager + Send + Sync>) -> Self {
        Self {
            inner: manager,
        }
    }
}

impl PersistenceManager for SharedPersistenceManager {
    fn load(&self) -> Result<Option<ShieldState>, PersistError> {
        self.inner.load()
    }

    fn save(&self, state: &ShieldState) -> Result<(), PersistError> {
        self.inner.save(state)
    }
}
