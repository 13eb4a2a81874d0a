// demos/minimal/src/main.rs
// ============================================================================
// Module: Query Shield Minimal Demo
// Description: Minimal end-to-end Query Shield run using in-memory adapters.
// Purpose: Demonstrate whitelist/check/remove against an in-memory store.
// Dependencies: query-shield-core
// ============================================================================

//! ## Overview
//! Runs a minimal Query Shield session using in-memory persistence. A query
//! is whitelisted for one of two roles, checked from both, and removed. This
//! demo is backend-agnostic and suitable for quick verification.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use query_shield_core::ClientRole;
use query_shield_core::ClientRoleId;
use query_shield_core::ErrorCode;
use query_shield_core::FixedClock;
use query_shield_core::InMemoryPersistence;
use query_shield_core::NoopAuditSink;
use query_shield_core::Parameter;
use query_shield_core::QuerySpec;
use query_shield_core::SequenceIdGenerator;
use query_shield_core::Shield;
use query_shield_core::ShieldConfig;
use query_shield_core::Timestamp;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shield = Shield::with_dependencies(
        ShieldConfig::default(),
        Some(InMemoryPersistence::new()),
        vec![
            ClientRole {
                id: ClientRoleId::new(1),
                name: "guest".to_string(),
            },
            ClientRole {
                id: ClientRoleId::new(2),
                name: "member".to_string(),
            },
        ],
        FixedClock::new(Timestamp::UNIX_EPOCH),
        SequenceIdGenerator::new(),
        Arc::new(NoopAuditSink),
    )?;

    let mut parameters = BTreeMap::new();
    parameters.insert("name".to_string(), Parameter {
        max_value_length: 32,
    });
    let records = shield.whitelist(vec![QuerySpec {
        query: "query ($name: String!) {\n  user(name: $name) {\n    id\n  }\n}".to_string(),
        name: "userByName".to_string(),
        parameters,
        whitelisted_for: vec![ClientRoleId::new(2)],
    }])?;
    let record = records.first().ok_or("whitelist returned no entry")?;
    write_line("Whitelisted", record.id.as_str())?;

    let mut arguments = BTreeMap::new();
    arguments.insert("name".to_string(), "ada".to_string());

    let query = b"query ($name: String!) { user(name: $name) { id } }".to_vec();
    let normalized = shield.check(ClientRoleId::new(2), query.clone(), &arguments)?;
    write_line("Member check", &String::from_utf8_lossy(&normalized))?;

    match shield.check(ClientRoleId::new(1), query, &arguments) {
        Ok(_) => write_line("Guest check", "allowed")?,
        Err(err) => {
            let label = err.code().map_or("error", ErrorCode::as_str);
            write_line("Guest check", &format!("{label}: {err}"))?;
        }
    }

    shield.remove(record)?;
    write_line("Entries after removal", &shield.entry_count()?.to_string())?;

    Ok(())
}

/// Writes a labeled line to stdout.
fn write_line(label: &str, value: &str) -> Result<(), std::io::Error> {
    let mut out = std::io::stdout();
    writeln!(out, "{label}: {value}")?;
    Ok(())
}
