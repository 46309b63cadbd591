//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The resolver produced no candidate for a logical table name.
    #[error("No source table matches logical name '{0}'")]
    NotFound(String),

    /// The source catalog is unreachable or inconsistent.
    #[error("Schema read failed: {0}")]
    SchemaRead(String),

    /// A bounded read against a resolved table failed.
    #[error("Extraction failed for table {table}: {message}")]
    Extraction { table: String, message: String },

    /// Landing-table DDL was rejected by the target store.
    #[error("Provisioning failed for table {table}: {message}")]
    Provision { table: String, message: String },

    /// A multi-row insert was rejected. Always recovered via per-row
    /// fallback; only surfaces when fallback cannot reach the target at all.
    #[error("Batch load failed for table {table}: {message}")]
    Load { table: String, message: String },

    /// A single row was rejected during fallback. Absorbed and counted by
    /// the loader, never propagated past it.
    #[error("Row rejected for table {table}: {message}")]
    Row { table: String, message: String },

    /// An I/O call exceeded the configured per-call timeout.
    #[error("Operation '{0}' timed out")]
    Timeout(String),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a SchemaRead error.
    pub fn schema_read(message: impl Into<String>) -> Self {
        MigrateError::SchemaRead(message.into())
    }

    /// Create an Extraction error.
    pub fn extraction(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Extraction {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Provision error.
    pub fn provision(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Provision {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Load error.
    pub fn load(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Load {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Row error.
    pub fn row(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Row {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 2,
            MigrateError::NotFound(_) => 3,
            MigrateError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
