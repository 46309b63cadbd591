//! Source catalog discovery.
//!
//! The [`SchemaCatalog`] lists base tables and their columns from an
//! information-schema-like interface exposed by a [`SourceService`]. No
//! caching is performed: the catalog may change between calls and callers
//! must not assume stability across a run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::source::SourceService;

/// Kind of catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    BaseTable,
    View,
}

/// A table discovered on the source. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Schema the table lives in (e.g. "dbo").
    pub schema: String,

    /// Physical table name as reported by the source catalog.
    pub name: String,

    /// Catalog object kind.
    pub kind: TableKind,
}

impl TableDescriptor {
    /// Create a base-table descriptor.
    pub fn base(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: TableKind::BaseTable,
        }
    }

    /// Get the fully qualified name ("schema.name").
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A column of a discovered table.
///
/// Ordinal order is preserved end-to-end: source column order equals landing
/// table column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as reported by the source catalog.
    pub name: String,

    /// 1-based position within the table.
    pub ordinal: usize,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// Catalog facade over a source service.
///
/// Maps any service failure to [`MigrateError::SchemaRead`] so callers see a
/// single error shape for "the catalog could not be read", whether the source
/// was unreachable or the table vanished between listing and inspection.
pub struct SchemaCatalog {
    source: Arc<dyn SourceService>,
}

impl SchemaCatalog {
    /// Create a catalog over the given source service.
    pub fn new(source: Arc<dyn SourceService>) -> Self {
        Self { source }
    }

    /// List base tables visible on the source.
    pub async fn list_tables(&self) -> Result<Vec<TableDescriptor>> {
        let tables = self
            .source
            .list_tables()
            .await
            .map_err(|e| MigrateError::schema_read(e.to_string()))?;
        debug!("Discovered {} source tables", tables.len());
        Ok(tables)
    }

    /// List the columns of a discovered table in ordinal order.
    pub async fn list_columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>> {
        let mut columns = self
            .source
            .list_columns(table)
            .await
            .map_err(|e| MigrateError::schema_read(e.to_string()))?;
        columns.sort_by_key(|c| c.ordinal);
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;

    #[test]
    fn test_full_name() {
        let t = TableDescriptor::base("dbo", "Patient");
        assert_eq!(t.full_name(), "dbo.Patient");
    }

    #[tokio::test]
    async fn test_list_columns_sorted_by_ordinal() {
        let source = MemorySource::new("dbo").with_table(
            "Patient",
            vec!["ID", "Name", "BirthDate"],
            Vec::new(),
        );
        let catalog = SchemaCatalog::new(Arc::new(source));
        let tables = catalog.list_tables().await.unwrap();
        let cols = catalog.list_columns(&tables[0]).await.unwrap();
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Name", "BirthDate"]);
        assert_eq!(cols[0].ordinal, 1);
    }

    #[tokio::test]
    async fn test_missing_table_maps_to_schema_read() {
        let source = MemorySource::new("dbo");
        let catalog = SchemaCatalog::new(Arc::new(source));
        let ghost = TableDescriptor::base("dbo", "Vanished");
        let err = catalog.list_columns(&ghost).await.unwrap_err();
        assert!(matches!(err, MigrateError::SchemaRead(_)));
    }
}
