// crates/query-shield-config/src/config.rs
// ============================================================================
// Module: Query Shield Configuration
// Description: Configuration loading and validation for Query Shield.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: query-shield-core, query-shield-store-file, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed so the shield never starts
//! with an open policy by accident. Config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use query_shield_core::ClientRole;
use query_shield_core::ClientRoleId;
use query_shield_core::WhitelistOption;
use query_shield_store_file::DEFAULT_MAX_STATE_BYTES;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "query-shield.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "QUERY_SHIELD_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of role entries.
pub(crate) const MAX_ROLES: usize = 1024;
/// Maximum length of a role name.
pub(crate) const MAX_ROLE_NAME_LENGTH: usize = 256;
/// Maximum configurable snapshot size in bytes.
pub(crate) const MAX_SNAPSHOT_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Query Shield configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryShieldConfig {
    /// Shield engine configuration.
    #[serde(default)]
    pub shield: ShieldSectionConfig,
    /// Snapshot persistence configuration.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Client role entries.
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

impl QueryShieldConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any section fails validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.persistence.validate()?;
        self.audit.validate()?;
        ensure_role_entries_valid(&self.roles)?;
        Ok(())
    }

    /// Converts configured role entries into engine roles.
    #[must_use]
    pub fn to_roles(&self) -> Vec<ClientRole> {
        self.roles
            .iter()
            .map(|role| ClientRole {
                id: ClientRoleId::new(role.id),
                name: role.name.clone(),
            })
            .collect()
    }
}

/// Shield engine section configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct ShieldSectionConfig {
    /// Whitelist enforcement mode.
    #[serde(default)]
    pub whitelist: WhitelistOption,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Persistence backend type.
    #[serde(rename = "type", default)]
    pub store_type: PersistenceType,
    /// Snapshot file path when using the file backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Whether each save forces the snapshot to stable storage.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    /// Maximum snapshot size in bytes.
    #[serde(default = "default_max_state_bytes")]
    pub max_state_bytes: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            store_type: PersistenceType::default(),
            path: None,
            sync_writes: default_sync_writes(),
            max_state_bytes: default_max_state_bytes(),
        }
    }
}

impl PersistenceConfig {
    /// Validates persistence configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            PersistenceType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory persistence must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            PersistenceType::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file persistence requires path".to_string())
                })?;
                validate_store_path(path)?;
                if self.max_state_bytes == 0 {
                    return Err(ConfigError::Invalid(
                        "persistence max_state_bytes must be greater than zero".to_string(),
                    ));
                }
                if self.max_state_bytes > MAX_SNAPSHOT_BYTES {
                    return Err(ConfigError::Invalid(
                        "persistence max_state_bytes exceeds limit".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Persistence backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceType {
    /// Keep snapshots in process memory only.
    #[default]
    Memory,
    /// Persist snapshots to a flat JSON file.
    File,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditConfig {
    /// Audit sink type.
    #[serde(default)]
    pub mode: AuditMode,
    /// Audit log path when using the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            AuditMode::None | AuditMode::Stderr => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "audit path requires file mode".to_string(),
                    ));
                }
                Ok(())
            }
            AuditMode::File => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("file audit requires path".to_string()))?;
                validate_store_path(path)?;
                Ok(())
            }
        }
    }
}

/// Audit sink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Discard audit events.
    #[default]
    None,
    /// Write audit events to stderr.
    Stderr,
    /// Append audit events to a file.
    File,
}

/// Client role entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleConfig {
    /// Numeric role identifier.
    pub id: u64,
    /// Human-readable role name.
    pub name: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured store path against length constraints.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("store path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates role entries for emptiness, limits, and uniqueness.
fn ensure_role_entries_valid(roles: &[RoleConfig]) -> Result<(), ConfigError> {
    if roles.is_empty() {
        return Err(ConfigError::Invalid("roles must not be empty".to_string()));
    }
    if roles.len() > MAX_ROLES {
        return Err(ConfigError::Invalid("roles exceed entry limit".to_string()));
    }
    for (index, role) in roles.iter().enumerate() {
        if role.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("role {} name must be non-empty", role.id)));
        }
        if role.name.len() > MAX_ROLE_NAME_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "role {} name exceeds length limit",
                role.id
            )));
        }
        if roles.iter().skip(index + 1).any(|other| other.id == role.id) {
            return Err(ConfigError::Invalid(format!("duplicate role id: {}", role.id)));
        }
        if roles.iter().skip(index + 1).any(|other| other.name == role.name) {
            return Err(ConfigError::Invalid(format!("duplicate role name: {}", role.name)));
        }
    }
    Ok(())
}

/// Returns the default durability setting for saves.
const fn default_sync_writes() -> bool {
    true
}

/// Returns the default snapshot size ceiling.
const fn default_max_state_bytes() -> usize {
    DEFAULT_MAX_STATE_BYTES
}
