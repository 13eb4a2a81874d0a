// crates/query-shield-core/src/lib.rs
// ============================================================================
// Module: Query Shield Core Library
// Description: Public API surface for the Query Shield core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Query Shield core provides whitelist-based query firewalling for services
//! that must only execute pre-approved query documents. It is
//! backend-agnostic and integrates through explicit interfaces rather than
//! embedding into any particular server framework.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::IdGenerator;
pub use interfaces::PersistError;
pub use interfaces::PersistenceManager;
pub use runtime::AccessDecision;
pub use runtime::AccessRule;
pub use runtime::CheckAuditEvent;
pub use runtime::CheckAuditEventParams;
pub use runtime::CheckOutcome;
pub use runtime::ErrorCode;
pub use runtime::FileAuditSink;
pub use runtime::FixedClock;
pub use runtime::InMemoryPersistence;
pub use runtime::IndexError;
pub use runtime::MutationAction;
pub use runtime::MutationAuditEvent;
pub use runtime::MutationAuditEventParams;
pub use runtime::NoopAuditSink;
pub use runtime::RandomIdGenerator;
pub use runtime::SequenceIdGenerator;
pub use runtime::Session;
pub use runtime::SharedPersistenceManager;
pub use runtime::Shield;
pub use runtime::ShieldAuditSink;
pub use runtime::ShieldConfig;
pub use runtime::ShieldError;
pub use runtime::StderrAuditSink;
pub use runtime::SystemClock;
pub use runtime::WhitelistIndex;
pub use runtime::WhitelistOption;
pub use runtime::authorize;
