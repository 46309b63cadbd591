//! Row extraction from the source system.
//!
//! Pulls a row-capped sample of a resolved table together with its pre-cap
//! row count. The cap keeps a single pathological table from dominating a
//! run; the count lets downstream reporting say how much was left behind.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::TableDescriptor;
use crate::error::{MigrateError, Result};
use crate::source::{SourceService, TableSample};

/// Result of extracting one table.
#[derive(Debug)]
pub struct Extraction {
    /// The capped sample, in source column order.
    pub sample: TableSample,
    /// Rows present in the source before the cap was applied.
    pub source_count: i64,
}

/// Reads capped samples from the source.
pub struct Extractor {
    source: Arc<dyn SourceService>,
    row_cap: usize,
}

impl Extractor {
    pub fn new(source: Arc<dyn SourceService>, row_cap: usize) -> Self {
        Self { source, row_cap }
    }

    /// Extract up to `row_cap` rows of `table`.
    ///
    /// A table with zero columns is an extraction error: there is nothing
    /// to land and provisioning it would produce an unusable table. A table
    /// with columns but zero rows is fine and yields an empty sample.
    pub async fn extract(&self, table: &TableDescriptor) -> Result<Extraction> {
        let sample = self.source.read_sample(table, self.row_cap).await?;

        if sample.columns.is_empty() {
            return Err(MigrateError::extraction(
                table.full_name(),
                "table has no columns",
            ));
        }

        let source_count = self.source.row_count(table).await?;
        debug!(
            "{}: extracted {} of {} rows",
            table.full_name(),
            sample.len(),
            source_count
        );

        Ok(Extraction {
            sample,
            source_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;
    use crate::source::RawValue;

    fn text_row(cells: &[&str]) -> Vec<RawValue> {
        cells.iter().map(|c| RawValue::Text(c.to_string())).collect()
    }

    #[tokio::test]
    async fn test_extract_respects_row_cap() {
        let rows: Vec<Vec<RawValue>> = (0..10).map(|i| text_row(&[&i.to_string()])).collect();
        let source = Arc::new(MemorySource::new("dbo").with_table("Big", vec!["Id"], rows));

        let extractor = Extractor::new(source, 4);
        let table = TableDescriptor::base("dbo", "Big");
        let extraction = extractor.extract(&table).await.unwrap();

        assert_eq!(extraction.sample.len(), 4);
        assert_eq!(extraction.source_count, 10);
    }

    #[tokio::test]
    async fn test_empty_table_yields_empty_sample() {
        let source = Arc::new(MemorySource::new("dbo").with_table("Empty", vec!["Id"], vec![]));
        let extractor = Extractor::new(source, 100);
        let table = TableDescriptor::base("dbo", "Empty");
        let extraction = extractor.extract(&table).await.unwrap();

        assert!(extraction.sample.is_empty());
        assert_eq!(extraction.sample.columns.len(), 1);
        assert_eq!(extraction.source_count, 0);
    }

    #[tokio::test]
    async fn test_zero_columns_is_an_error() {
        let source =
            Arc::new(MemorySource::new("dbo").with_table("Ghost", Vec::<String>::new(), vec![]));
        let extractor = Extractor::new(source, 100);
        let table = TableDescriptor::base("dbo", "Ghost");

        assert!(matches!(
            extractor.extract(&table).await,
            Err(MigrateError::Extraction { .. })
        ));
    }
}
