// query-shield-config/src/lib.rs
// ============================================================================
// Module: Query Shield Config Library
// Description: Canonical config model and validation for Query Shield.
// Purpose: Single source of truth for query-shield.toml semantics.
// Dependencies: query-shield-core, query-shield-store-file, serde, toml
// ============================================================================

//! ## Overview
//! `query-shield-config` defines the canonical configuration model for
//! Query Shield deployments. It provides strict, fail-closed validation so
//! a misconfigured shield refuses to start instead of running open.
//! Config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
