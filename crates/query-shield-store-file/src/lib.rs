// crates/query-shield-store-file/src/lib.rs
// ============================================================================
// Module: File Shield Store
// Description: Durable PersistenceManager backend using a flat JSON file.
// Purpose: Provide production-grade persistence for shield snapshots.
// Dependencies: query-shield-core, serde_json
// ============================================================================

//! ## Overview
//! This crate provides a file-backed [`PersistenceManager`] implementation
//! that persists whole shield snapshots as JSON. Every save rewrites the
//! full snapshot; loads fail closed on oversized or undecodable content.
//! Storage inputs are untrusted.
//!
//! [`PersistenceManager`]: query_shield_core::PersistenceManager

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::DEFAULT_MAX_STATE_BYTES;
pub use store::FileShieldStore;
pub use store::FileStoreConfig;
pub use store::FileStoreError;
