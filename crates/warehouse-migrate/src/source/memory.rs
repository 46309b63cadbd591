//! In-memory source service.
//!
//! Holds literal tables for unit and integration tests, and backs dry runs
//! in environments without source connectivity.

use async_trait::async_trait;

use crate::catalog::{ColumnDescriptor, TableDescriptor};
use crate::error::{MigrateError, Result};
use crate::source::{RawValue, SourceService, TableSample};

struct MemoryTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

/// Source service backed by in-memory tables.
pub struct MemorySource {
    schema: String,
    tables: Vec<MemoryTable>,
}

impl MemorySource {
    /// Create an empty source for the given schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table with the given columns and rows.
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        columns: Vec<impl Into<String>>,
        rows: Vec<Vec<RawValue>>,
    ) -> Self {
        self.tables.push(MemoryTable {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        });
        self
    }

    fn find(&self, table: &TableDescriptor) -> Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.name == table.name)
            .ok_or_else(|| {
                MigrateError::schema_read(format!("table {} not found", table.full_name()))
            })
    }
}

#[async_trait]
impl SourceService for MemorySource {
    async fn list_tables(&self) -> Result<Vec<TableDescriptor>> {
        Ok(self
            .tables
            .iter()
            .map(|t| TableDescriptor::base(self.schema.clone(), t.name.clone()))
            .collect())
    }

    async fn list_columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>> {
        let t = self.find(table)?;
        Ok(t.columns
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnDescriptor::new(name.clone(), i + 1))
            .collect())
    }

    async fn read_sample(&self, table: &TableDescriptor, row_cap: usize) -> Result<TableSample> {
        let t = self.find(table)?;
        let columns = self.list_columns(table).await?;
        let rows = t.rows.iter().take(row_cap).cloned().collect();
        Ok(TableSample { columns, rows })
    }

    async fn row_count(&self, table: &TableDescriptor) -> Result<i64> {
        Ok(self.find(table)?.rows.len() as i64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_source() -> MemorySource {
        MemorySource::new("dbo").with_table(
            "Patient",
            vec!["ID", "Name"],
            vec![
                vec![RawValue::Int(1), RawValue::from("Ada")],
                vec![RawValue::Int(2), RawValue::from("Grace")],
                vec![RawValue::Int(3), RawValue::Null],
            ],
        )
    }

    #[tokio::test]
    async fn test_read_sample_applies_cap() {
        let source = patient_source();
        let table = TableDescriptor::base("dbo", "Patient");
        let sample = source.read_sample(&table, 2).await.unwrap();
        assert_eq!(sample.len(), 2);
        // row_count still reports the pre-cap total
        assert_eq!(source.row_count(&table).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table_is_schema_read_error() {
        let source = patient_source();
        let ghost = TableDescriptor::base("dbo", "Ghost");
        assert!(matches!(
            source.read_sample(&ghost, 10).await.unwrap_err(),
            MigrateError::SchemaRead(_)
        ));
    }
}
