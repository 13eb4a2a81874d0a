// query-shield-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical examples for Query Shield configuration. Outputs are
//! deterministic and kept in sync with the config model.

/// Returns a canonical example `query-shield.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[shield]
whitelist = "enabled"

[persistence]
type = "file"
path = "query-shield.json"
sync_writes = true
max_state_bytes = 16777216

[audit]
mode = "stderr"
# mode = "file"
# path = "query-shield-audit.log"

[[roles]]
id = 1
name = "admin"

[[roles]]
id = 2
name = "service"

[[roles]]
id = 3
name = "reader"
"#,
    )
}
