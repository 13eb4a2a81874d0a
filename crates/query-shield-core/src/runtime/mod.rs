// crates/query-shield-core/src/runtime/mod.rs
// ============================================================================
// Module: Query Shield Runtime
// Description: Shield engine, whitelist index, stores, audit, and helpers.
// Purpose: Enforce whitelist policy behind one engine shared by all surfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the shield engine, its whitelist index, the
//! built-in persistence and dependency sources, audit sinks, and session
//! authorization. All external surfaces must call into the same engine
//! logic so policy decisions never diverge between transports.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod authz;
pub mod index;
pub mod shield;
pub mod sources;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::CheckAuditEvent;
pub use audit::CheckAuditEventParams;
pub use audit::CheckOutcome;
pub use audit::FileAuditSink;
pub use audit::MutationAction;
pub use audit::MutationAuditEvent;
pub use audit::MutationAuditEventParams;
pub use audit::NoopAuditSink;
pub use audit::ShieldAuditSink;
pub use audit::StderrAuditSink;
pub use authz::AccessDecision;
pub use authz::AccessRule;
pub use authz::Session;
pub use authz::authorize;
pub use index::IndexError;
pub use index::WhitelistIndex;
pub use shield::ErrorCode;
pub use shield::Shield;
pub use shield::ShieldConfig;
pub use shield::ShieldError;
pub use shield::WhitelistOption;
pub use sources::FixedClock;
pub use sources::RandomIdGenerator;
pub use sources::SequenceIdGenerator;
pub use sources::SystemClock;
pub use store::InMemoryPersistence;
pub use store::SharedPersistenceManager;
