// crates/query-shield-core/src/runtime/sources.rs
// ============================================================================
// Module: Query Shield Runtime Sources
// Description: Default clock and id generator implementations.
// Purpose: Provide injectable time and identifier sources for the shield.
// Dependencies: crate::core, crate::interfaces, rand, time
// ============================================================================

//! ## Overview
//! The shield receives its clock and id generator through interfaces so tests
//! can substitute deterministic sources. This module provides the production
//! implementations plus fixed and sequential variants for tests and demos.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;
use time::OffsetDateTime;

use crate::core::identifiers::QueryId;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::IdGenerator;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Wall-clock time source backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(OffsetDateTime::now_utc())
    }
}

/// Deterministic clock returning one fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// Timestamp returned on every call.
    at: Timestamp,
}

impl FixedClock {
    /// Creates a clock pinned to the given timestamp.
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self {
            at,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at
    }
}

// ============================================================================
// SECTION: Id Generators
// ============================================================================

/// Instance-scoped random id generator.
///
/// # Invariants
/// - Issued identifiers are unique within the generator's lifetime.
#[derive(Debug)]
pub struct RandomIdGenerator {
    /// Instance-scoped random value for entropy.
    instance_id: u64,
    /// Monotonic counter for ids issued by this generator.
    counter: AtomicU64,
}

impl RandomIdGenerator {
    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            instance_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> QueryId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        QueryId::new(format!("{:016x}-{:016x}", self.instance_id, seq))
    }
}

/// Deterministic sequential id generator for tests and demos.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    /// Monotonic counter for ids issued by this generator.
    counter: AtomicU64,
}

impl SequenceIdGenerator {
    /// Creates a generator starting at one.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> QueryId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        QueryId::new(format!("query-{seq}"))
    }
}
