//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user is required".into()));
    }
    if config.source.r#type != "postgres" {
        return Err(MigrateError::Config(format!(
            "source.type must be 'postgres', got '{}'",
            config.source.r#type
        )));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }
    if config.target.r#type != "postgres" {
        return Err(MigrateError::Config(format!(
            "target.type must be 'postgres', got '{}'",
            config.target.r#type
        )));
    }

    // Cannot land tables back into the source
    if config.source.host == config.target.host
        && config.source.port == config.target.port
        && config.source.database == config.target.database
        && config.source.schema == config.target.schema
    {
        return Err(MigrateError::Config(
            "source and target cannot be the same schema".into(),
        ));
    }

    // Worklist validation
    for entry in &config.tables {
        if entry.table.is_empty() {
            return Err(MigrateError::Config(
                "tables entries must have a non-empty table name".into(),
            ));
        }
    }

    // Migration config validation
    if let Some(0) = config.migration.workers {
        return Err(MigrateError::Config(
            "migration.workers must be at least 1".into(),
        ));
    }
    if config.migration.row_cap == 0 {
        return Err(MigrateError::Config(
            "migration.row_cap must be at least 1".into(),
        ));
    }
    if !(100..=500).contains(&config.migration.batch_size) {
        return Err(MigrateError::Config(format!(
            "migration.batch_size must be between 100 and 500, got {}",
            config.migration.batch_size
        )));
    }
    if config.migration.call_timeout_secs == 0 {
        return Err(MigrateError::Config(
            "migration.call_timeout_secs must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig, WorklistEntry};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                r#type: "postgres".to_string(),
                host: "legacy-db".to_string(),
                port: 5432,
                database: "practice".to_string(),
                user: "reader".to_string(),
                password: "password".to_string(),
                schema: "dbo".to_string(),
                ssl_mode: "disable".to_string(),
            },
            target: TargetConfig {
                r#type: "postgres".to_string(),
                host: "warehouse".to_string(),
                port: 5432,
                database: "landing".to_string(),
                user: "loader".to_string(),
                password: "password".to_string(),
                schema: "public".to_string(),
                ssl_mode: "disable".to_string(),
            },
            migration: MigrationConfig::default(),
            tables: vec![WorklistEntry::new("Patient")],
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_source_host() {
        let mut config = valid_config();
        config.source.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_schema_rejected() {
        let mut config = valid_config();
        config.target = TargetConfig {
            r#type: "postgres".to_string(),
            host: config.source.host.clone(),
            port: config.source.port,
            database: config.source.database.clone(),
            user: "loader".to_string(),
            password: "password".to_string(),
            schema: config.source.schema.clone(),
            ssl_mode: "disable".to_string(),
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_batch_size_out_of_range() {
        let mut config = valid_config();
        config.migration.batch_size = 50;
        assert!(validate(&config).is_err());
        config.migration.batch_size = 501;
        assert!(validate(&config).is_err());
        config.migration.batch_size = 500;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.migration.workers = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_456"),
            "Debug output should not contain actual password value"
        );
    }
}
