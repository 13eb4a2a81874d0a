// query-shield-cli/src/main.rs
// ============================================================================
// Module: Query Shield CLI Entry Point
// Description: Command dispatcher for Query Shield whitelist workflows.
// Purpose: Provide a safe CLI for whitelist inspection and mutation.
// Dependencies: clap, query-shield-config, query-shield-core, serde_json
// ============================================================================

//! ## Overview
//! The Query Shield CLI manages whitelist state through the same engine the
//! embedding service uses. Commands load the shared configuration, assemble
//! the shield with its configured persistence and audit sinks, and run one
//! operation. Inputs are untrusted and size-limited before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use query_shield_config::AuditMode;
use query_shield_config::PersistenceType;
use query_shield_config::QueryShieldConfig;
use query_shield_config::config_toml_example;
use query_shield_core::ClientRoleId;
use query_shield_core::FileAuditSink;
use query_shield_core::InMemoryPersistence;
use query_shield_core::NoopAuditSink;
use query_shield_core::Parameter;
use query_shield_core::QuerySpec;
use query_shield_core::RandomIdGenerator;
use query_shield_core::SharedPersistenceManager;
use query_shield_core::Shield;
use query_shield_core::ShieldAuditSink;
use query_shield_core::ShieldConfig;
use query_shield_core::StderrAuditSink;
use query_shield_core::SystemClock;
use query_shield_store_file::FileShieldStore;
use query_shield_store_file::FileStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an entry specification JSON input.
const MAX_SPEC_FILE_BYTES: usize = 1024 * 1024;
/// Maximum size of a query text input file.
const MAX_QUERY_FILE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "query-shield", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Optional config file path (defaults to query-shield.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered client roles.
    Roles,
    /// List whitelisted entries.
    List(ListCommand),
    /// Whitelist entries from a JSON file or inline flags.
    Add(AddCommand),
    /// Remove a whitelisted entry by name.
    Remove(RemoveCommand),
    /// Check a query for a role.
    Check(CheckCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `list` command.
#[derive(Args, Debug)]
struct ListCommand {
    /// Output format for the entry listing.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats for entry listings.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Tab-separated text output.
    Text,
    /// Pretty-printed JSON snapshot output.
    Json,
}

/// Arguments for the `add` command.
#[derive(Args, Debug)]
struct AddCommand {
    /// Path to a JSON file holding an array of entry specifications.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["query", "name", "role", "parameter"])]
    file: Option<PathBuf>,
    /// Inline query text for a single entry.
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,
    /// Entry name for the inline query.
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// Role id allowed to run the inline query (repeatable).
    #[arg(long = "role", value_name = "ID")]
    role: Vec<u64>,
    /// Argument bound for the inline query as NAME=MAX_LEN (repeatable).
    #[arg(long = "parameter", value_name = "NAME=MAX_LEN")]
    parameter: Vec<String>,
}

/// Arguments for the `remove` command.
#[derive(Args, Debug)]
struct RemoveCommand {
    /// Entry name to remove.
    #[arg(long, value_name = "NAME")]
    name: String,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Role id performing the check.
    #[arg(long, value_name = "ID")]
    role: u64,
    /// Inline query text.
    #[arg(long, value_name = "TEXT", conflicts_with = "query_file")]
    query: Option<String>,
    /// Path to a file holding the query text.
    #[arg(long, value_name = "PATH")]
    query_file: Option<PathBuf>,
    /// Query argument as NAME=VALUE (repeatable).
    #[arg(long = "argument", value_name = "NAME=VALUE")]
    argument: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print a canonical example configuration.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("query-shield {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Roles => command_roles(cli.config.as_deref()),
        Commands::List(command) => command_list(cli.config.as_deref(), &command),
        Commands::Add(command) => command_add(cli.config.as_deref(), command),
        Commands::Remove(command) => command_remove(cli.config.as_deref(), &command),
        Commands::Check(command) => command_check(cli.config.as_deref(), command),
        Commands::Config {
            command,
        } => command_config(cli.config.as_deref(), &command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Roles Command
// ============================================================================

/// Executes the `roles` command.
fn command_roles(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let shield = build_shield(config_path)?;
    let roles = shield.roles().map_err(|err| CliError::new(err.to_string()))?;
    for role in roles {
        write_stdout_line(&format!("{}\t{}", role.id, role.name))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(config_path: Option<&Path>, command: &ListCommand) -> CliResult<ExitCode> {
    let shield = build_shield(config_path)?;
    match command.format {
        OutputFormat::Text => {
            let entries = shield.list().map_err(|err| CliError::new(err.to_string()))?;
            for (name, record) in entries {
                let roles: Vec<String> =
                    record.whitelisted_for.iter().map(ToString::to_string).collect();
                write_stdout_line(&format!("{name}\t{}\t[{}]", record.id, roles.join(", ")))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
        OutputFormat::Json => {
            let state = shield.capture_state().map_err(|err| CliError::new(err.to_string()))?;
            let payload = serde_json::to_string_pretty(&state)
                .map_err(|err| CliError::new(format!("snapshot serialization failed: {err}")))?;
            write_stdout_line(&payload)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Add Command
// ============================================================================

/// Executes the `add` command.
fn command_add(config_path: Option<&Path>, command: AddCommand) -> CliResult<ExitCode> {
    let specs = collect_add_specs(command)?;
    let shield = build_shield(config_path)?;
    let records = shield.whitelist(specs).map_err(|err| CliError::new(err.to_string()))?;
    for record in &records {
        write_stdout_line(&format!("whitelisted {} as {}", record.name, record.id))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Collects entry specifications from file or inline arguments.
fn collect_add_specs(command: AddCommand) -> CliResult<Vec<QuerySpec>> {
    if let Some(path) = command.file {
        let bytes = read_bytes_with_limit(&path, MAX_SPEC_FILE_BYTES)
            .map_err(|err| read_error(&path, &err))?;
        let specs: Vec<QuerySpec> = serde_json::from_slice(&bytes)
            .map_err(|err| CliError::new(format!("entry file decode failed: {err}")))?;
        return Ok(specs);
    }
    let Some(query) = command.query else {
        return Err(CliError::new("add requires --file or --query".to_string()));
    };
    let Some(name) = command.name else {
        return Err(CliError::new("inline add requires --name".to_string()));
    };
    if command.role.is_empty() {
        return Err(CliError::new("inline add requires at least one --role".to_string()));
    }
    let mut parameters = BTreeMap::new();
    for raw in &command.parameter {
        let (key, value) = split_pair(raw, "parameter")?;
        let max_value_length: u32 = value.parse().map_err(|_| {
            CliError::new(format!("parameter {key} bound must be a positive integer"))
        })?;
        if parameters
            .insert(key.clone(), Parameter {
                max_value_length,
            })
            .is_some()
        {
            return Err(CliError::new(format!("parameter {key} is repeated")));
        }
    }
    Ok(vec![QuerySpec {
        query,
        name,
        parameters,
        whitelisted_for: command.role.iter().copied().map(ClientRoleId::new).collect(),
    }])
}

// ============================================================================
// SECTION: Remove Command
// ============================================================================

/// Executes the `remove` command.
fn command_remove(config_path: Option<&Path>, command: &RemoveCommand) -> CliResult<ExitCode> {
    let shield = build_shield(config_path)?;
    let entries = shield.list().map_err(|err| CliError::new(err.to_string()))?;
    let Some(record) = entries.get(&command.name) else {
        write_stderr_line(&format!("no entry named {}", command.name))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::FAILURE);
    };
    shield.remove(record).map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!("removed {}", command.name))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Executes the `check` command.
fn command_check(config_path: Option<&Path>, command: CheckCommand) -> CliResult<ExitCode> {
    let query = resolve_query_input(&command)?;
    let arguments = parse_arguments(&command.argument)?;
    let shield = build_shield(config_path)?;
    match shield.check(ClientRoleId::new(command.role), query, &arguments) {
        Ok(normalized) => {
            let text = String::from_utf8_lossy(&normalized).into_owned();
            write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let label = err.code().map_or_else(|| "error".to_string(), |code| code.to_string());
            write_stderr_line(&format!("{label}: {err}"))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Resolves the query bytes from inline text or a file.
fn resolve_query_input(command: &CheckCommand) -> CliResult<Vec<u8>> {
    if let Some(query) = &command.query {
        return Ok(query.clone().into_bytes());
    }
    let Some(path) = &command.query_file else {
        return Err(CliError::new("check requires --query or --query-file".to_string()));
    };
    read_bytes_with_limit(path, MAX_QUERY_FILE_BYTES).map_err(|err| read_error(path, &err))
}

/// Parses repeated NAME=VALUE argument flags into a map.
fn parse_arguments(raw: &[String]) -> CliResult<BTreeMap<String, String>> {
    let mut arguments = BTreeMap::new();
    for entry in raw {
        let (key, value) = split_pair(entry, "argument")?;
        if arguments.insert(key.clone(), value).is_some() {
            return Err(CliError::new(format!("argument {key} is repeated")));
        }
    }
    Ok(arguments)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(config_path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let _config = QueryShieldConfig::load(config_path)
                .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Shield Assembly
// ============================================================================

/// Shield alias used by all CLI commands.
type CliShield = Shield<SharedPersistenceManager, SystemClock, RandomIdGenerator>;

/// Builds the shield engine from resolved configuration.
fn build_shield(config_path: Option<&Path>) -> CliResult<CliShield> {
    let config = QueryShieldConfig::load(config_path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let persistence = build_persistence(&config)?;
    let audit = build_audit_sink(&config)?;
    let shield_config = ShieldConfig {
        option: config.shield.whitelist,
    };
    Shield::with_dependencies(
        shield_config,
        persistence,
        config.to_roles(),
        SystemClock,
        RandomIdGenerator::new(),
        audit,
    )
    .map_err(|err| CliError::new(format!("shield init failed: {err}")))
}

/// Builds the persistence manager from configuration.
fn build_persistence(config: &QueryShieldConfig) -> CliResult<Option<SharedPersistenceManager>> {
    let manager = match config.persistence.store_type {
        PersistenceType::Memory => {
            SharedPersistenceManager::from_manager(InMemoryPersistence::new())
        }
        PersistenceType::File => {
            let path = config
                .persistence
                .path
                .clone()
                .ok_or_else(|| CliError::new("file persistence requires path".to_string()))?;
            let store_config = FileStoreConfig {
                path,
                sync_writes: config.persistence.sync_writes,
                max_state_bytes: config.persistence.max_state_bytes,
            };
            let store = FileShieldStore::new(store_config)
                .map_err(|err| CliError::new(format!("store init failed: {err}")))?;
            SharedPersistenceManager::from_manager(store)
        }
    };
    Ok(Some(manager))
}

/// Builds the audit sink from configuration.
fn build_audit_sink(config: &QueryShieldConfig) -> CliResult<Arc<dyn ShieldAuditSink>> {
    let sink: Arc<dyn ShieldAuditSink> = match config.audit.mode {
        AuditMode::None => Arc::new(NoopAuditSink),
        AuditMode::Stderr => Arc::new(StderrAuditSink),
        AuditMode::File => {
            let path = config
                .audit
                .path
                .clone()
                .ok_or_else(|| CliError::new("file audit requires path".to_string()))?;
            let sink = FileAuditSink::new(&path)
                .map_err(|err| CliError::new(format!("audit init failed: {err}")))?;
            Arc::new(sink)
        }
    };
    Ok(sink)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let read_limit = limit.saturating_add(1);
    let mut limited = file.take(read_limit);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure into a CLI error.
fn read_error(path: &Path, error: &ReadLimitError) -> CliError {
    match error {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "input {} too large: {size} bytes (max {limit})",
            path.display()
        )),
    }
}

/// Splits a NAME=VALUE flag into trimmed name and raw value.
fn split_pair(raw: &str, kind: &str) -> CliResult<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CliError::new(format!("{kind} {raw} must use NAME=VALUE form")));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::new(format!("{kind} name must be non-empty")));
    }
    Ok((key.to_string(), value.to_string()))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output write failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
