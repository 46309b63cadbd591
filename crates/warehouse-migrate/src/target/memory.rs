//! In-memory target service.
//!
//! Stores landing tables in a map for tests and dry-run style usage, with
//! optional fault injection so loader fallback paths can be exercised
//! without a live warehouse.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MigrateError, Result};
use crate::target::TargetService;

#[derive(Debug, Clone)]
struct StoredTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Target service backed by an in-memory table map.
#[derive(Default)]
pub struct MemoryTarget {
    tables: Mutex<HashMap<String, StoredTable>>,
    /// Any row containing this marker in a cell is rejected on insert.
    reject_marker: Option<String>,
}

impl MemoryTarget {
    /// Create an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a target that rejects every row containing `marker` in any
    /// cell. Batch inserts containing such a row fail wholesale; single-row
    /// inserts fail only for the poisoned row.
    pub fn rejecting(marker: impl Into<String>) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            reject_marker: Some(marker.into()),
        }
    }

    /// Column names of a landing table, if it exists.
    pub fn columns_of(&self, landing_name: &str) -> Option<Vec<String>> {
        self.tables
            .lock()
            .unwrap()
            .get(landing_name)
            .map(|t| t.columns.clone())
    }

    /// Rows of a landing table, if it exists.
    pub fn rows_of(&self, landing_name: &str) -> Option<Vec<Vec<String>>> {
        self.tables
            .lock()
            .unwrap()
            .get(landing_name)
            .map(|t| t.rows.clone())
    }

    fn is_poisoned(&self, row: &[String]) -> bool {
        match &self.reject_marker {
            Some(marker) => row.iter().any(|cell| cell.contains(marker.as_str())),
            None => false,
        }
    }
}

#[async_trait]
impl TargetService for MemoryTarget {
    async fn drop_table(&self, landing_name: &str) -> Result<()> {
        self.tables.lock().unwrap().remove(landing_name);
        Ok(())
    }

    async fn create_table(&self, landing_name: &str, columns: &[String]) -> Result<()> {
        if columns.is_empty() {
            return Err(MigrateError::provision(landing_name, "no columns"));
        }
        self.tables.lock().unwrap().insert(
            landing_name.to_string(),
            StoredTable {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn insert_batch(
        &self,
        landing_name: &str,
        _columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        if rows.iter().any(|r| self.is_poisoned(r)) {
            return Err(MigrateError::load(landing_name, "batch insert rejected"));
        }
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(landing_name)
            .ok_or_else(|| MigrateError::load(landing_name, "table does not exist"))?;
        table.rows.extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }

    async fn insert_row(
        &self,
        landing_name: &str,
        _columns: &[String],
        row: &[String],
    ) -> Result<()> {
        if self.is_poisoned(row) {
            return Err(MigrateError::row(landing_name, "row insert rejected"));
        }
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(landing_name)
            .ok_or_else(|| MigrateError::load(landing_name, "table does not exist"))?;
        table.rows.push(row.to_vec());
        Ok(())
    }

    async fn count_rows(&self, landing_name: &str) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(landing_name)
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| MigrateError::load(landing_name, "table does not exist"))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_replaces_prior_table() {
        let target = MemoryTarget::new();
        let cols3: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        target.create_table("DBO_T", &cols3).await.unwrap();
        target
            .insert_row("DBO_T", &cols3, &["1".into(), "2".into(), "3".into()])
            .await
            .unwrap();

        let cols5: Vec<String> =
            vec!["A".into(), "B".into(), "C".into(), "D".into(), "E".into()];
        target.drop_table("DBO_T").await.unwrap();
        target.create_table("DBO_T", &cols5).await.unwrap();

        assert_eq!(target.columns_of("DBO_T").unwrap(), cols5);
        assert_eq!(target.count_rows("DBO_T").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejecting_marker_poisons_batch_but_not_clean_rows() {
        let target = MemoryTarget::rejecting("\u{0}");
        let cols: Vec<String> = vec!["V".into()];
        target.create_table("DBO_T", &cols).await.unwrap();

        let batch = vec![vec!["ok".to_string()], vec!["bad\u{0}cell".to_string()]];
        assert!(matches!(
            target.insert_batch("DBO_T", &cols, &batch).await,
            Err(MigrateError::Load { .. })
        ));

        target
            .insert_row("DBO_T", &cols, &["ok".to_string()])
            .await
            .unwrap();
        assert!(matches!(
            target
                .insert_row("DBO_T", &cols, &["bad\u{0}cell".to_string()])
                .await,
            Err(MigrateError::Row { .. })
        ));
        assert_eq!(target.count_rows("DBO_T").await.unwrap(), 1);
    }
}
