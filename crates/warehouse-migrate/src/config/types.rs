//! Configuration type definitions with auto-tuning based on system resources.

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::info;

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in bytes.
    pub total_memory_bytes: u64,
    /// Total RAM in GB.
    pub total_memory_gb: f64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let total_memory_bytes = sys.total_memory();
        let total_memory_gb = total_memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
        let cpu_cores = sys.cpus().len();

        Self {
            total_memory_bytes,
            total_memory_gb,
            cpu_cores,
        }
    }

    /// Log detected system resources.
    pub fn log(&self) {
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            self.total_memory_gb, self.cpu_cores
        );
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration.
    pub source: SourceConfig,

    /// Warehouse target configuration.
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Tables to migrate, by logical name.
    #[serde(default)]
    pub tables: Vec<WorklistEntry>,
}

impl Config {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that weren't explicitly set in the config file.
    pub fn with_auto_tuning(mut self) -> Self {
        let resources = SystemResources::detect();
        resources.log();
        self.migration = self.migration.with_auto_tuning(&resources);
        self
    }
}

/// One table requested for migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistEntry {
    /// Logical table name as operators know it.
    pub table: String,

    /// Physical name to use instead of resolving, when the operator already
    /// knows the source table.
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_name: Option<String>,
}

impl WorklistEntry {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            override_name: None,
        }
    }
}

/// Source database (legacy PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "postgres" for now).
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Source schema (default: "dbo").
    #[serde(default = "default_dbo_schema")]
    pub schema: String,

    /// SSL mode (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Warehouse target (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "postgres" for now).
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Landing schema (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,

    /// SSL mode (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
/// Worker count uses Option<T> to distinguish between "not set" (use the
/// auto-tuned default) and "explicitly set" (use the provided value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Number of parallel workers. Auto-tuned based on CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Maximum rows extracted per table (default: 10000).
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,

    /// Rows per insert batch (default: 200).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum characters kept per cell after sanitization (default: 16000).
    #[serde(default = "default_max_cell_len")]
    pub max_cell_len: usize,

    /// Per-call timeout for source and target operations, in seconds
    /// (default: 300).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Compare landing counts after loading (default: true).
    #[serde(default = "default_true")]
    pub validate: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            workers: None,
            row_cap: default_row_cap(),
            batch_size: default_batch_size(),
            max_cell_len: default_max_cell_len(),
            call_timeout_secs: default_call_timeout(),
            validate: default_true(),
        }
    }
}

impl MigrationConfig {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that are None (not explicitly set).
    pub fn with_auto_tuning(mut self, resources: &SystemResources) -> Self {
        let cores = resources.cpu_cores;

        // Workers: cores - 2, but at least 2 and at most 16
        if self.workers.is_none() {
            let workers = cores.saturating_sub(2).clamp(2, 16);
            self.workers = Some(workers);
        }

        info!(
            "Auto-tuned config: workers={}, row_cap={}, batch_size={}",
            self.get_workers(),
            self.row_cap,
            self.batch_size
        );

        self
    }

    /// Effective worker count, with a fallback default when the config
    /// hasn't been auto-tuned yet.
    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(4)
    }
}

// Default value functions for serde
fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_dbo_schema() -> String {
    "dbo".to_string()
}

fn default_public_schema() -> String {
    "public".to_string()
}

fn default_prefer() -> String {
    "prefer".to_string()
}

fn default_row_cap() -> usize {
    10_000
}

fn default_batch_size() -> usize {
    200
}

fn default_max_cell_len() -> usize {
    16_000
}

fn default_call_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}
