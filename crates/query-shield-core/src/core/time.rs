// crates/query-shield-core/src/core/time.rs
// ============================================================================
// Module: Query Shield Time Model
// Description: Canonical timestamp representation for whitelist entries.
// Purpose: Provide replayable creation times with a stable RFC 3339 wire form.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Query Shield stamps every whitelist entry with its creation time. The core
//! never reads wall-clock time directly; timestamps are supplied through the
//! clock interface so that restores and tests stay deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp recorded on whitelist entries.
///
/// # Invariants
/// - Serializes as an RFC 3339 string on the wire.
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Timestamp of the unix epoch.
    pub const UNIX_EPOCH: Self = Self(OffsetDateTime::UNIX_EPOCH);

    /// Creates a timestamp from an explicit datetime value.
    #[must_use]
    pub const fn new(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Creates a timestamp from whole unix seconds (returns `None` out of range).
    #[must_use]
    pub fn from_unix_timestamp(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    /// Returns the underlying datetime value.
    #[must_use]
    pub const fn get(self) -> OffsetDateTime {
        self.0
    }
}
