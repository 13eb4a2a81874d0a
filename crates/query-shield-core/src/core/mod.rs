// crates/query-shield-core/src/core/mod.rs
// ============================================================================
// Module: Query Shield Core Types
// Description: Canonical Query Shield schema and snapshot structures.
// Purpose: Provide stable, serializable types for whitelist entries and state.
// Dependencies: serde, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Query Shield core types define client roles, whitelist entries, the
//! normalizer, and the persisted snapshot format. These types are the
//! canonical source of truth for any derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod normalize;
pub mod query;
pub mod roles;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::hash_bytes;
pub use identifiers::ClientRoleId;
pub use identifiers::QueryId;
pub use normalize::NormalizeError;
pub use normalize::normalize;
pub use normalize::normalize_in_place;
pub use query::Parameter;
pub use query::QueryError;
pub use query::QueryRecord;
pub use query::QuerySpec;
pub use roles::ClientRole;
pub use roles::RoleError;
pub use roles::RoleRegistry;
pub use state::QueryModel;
pub use state::ShieldState;
pub use time::Timestamp;
