//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use crate::error::Result;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host, self.port, self.database, self.user, self.password, self.ssl_mode
        )
    }
}

impl TargetConfig {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host, self.port, self.database, self.user, self.password, self.ssl_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
source:
  host: legacy-db
  database: practice
  user: reader
  password: secret
  schema: dbo

target:
  host: warehouse
  database: landing
  user: loader
  password: secret

migration:
  row_cap: 500
  batch_size: 250

tables:
  - table: Patient
  - table: AppSchedule
    override: AppSch_Appointment
"#;

    #[test]
    fn test_from_yaml_parses_worklist_and_defaults() {
        let config = Config::from_yaml(SAMPLE_YAML).unwrap();

        assert_eq!(config.source.port, 5432);
        assert_eq!(config.source.schema, "dbo");
        assert_eq!(config.target.schema, "public");
        assert_eq!(config.migration.row_cap, 500);
        assert_eq!(config.migration.batch_size, 250);
        assert!(config.migration.validate);
        assert!(config.migration.workers.is_none());

        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[0].table, "Patient");
        assert!(config.tables[0].override_name.is_none());
        assert_eq!(
            config.tables[1].override_name.as_deref(),
            Some("AppSch_Appointment")
        );
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        assert!(Config::from_yaml("source: [not, a, mapping]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_YAML.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.database, "practice");
        assert!(Config::load("/definitely/not/here.yaml").is_err());
    }

    #[test]
    fn test_connection_strings() {
        let config = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(
            config.source.connection_string(),
            "host=legacy-db port=5432 dbname=practice user=reader password=secret sslmode=prefer"
        );
        assert!(config
            .target
            .connection_string()
            .starts_with("host=warehouse"));
    }
}
