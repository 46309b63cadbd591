//! Target table service.
//!
//! The warehouse side of the engine: drop/create landing tables and insert
//! sanitized text rows, multi-row for the fast path and single-row for the
//! fallback path. Everything lands as wide text; typed modeling is a
//! downstream concern.

pub mod memory;
pub mod postgres;

pub use memory::MemoryTarget;
pub use postgres::PostgresTarget;

use async_trait::async_trait;

use crate::error::Result;

/// Write-side interface to the warehouse landing schema.
#[async_trait]
pub trait TargetService: Send + Sync {
    /// Drop a landing table if it exists.
    async fn drop_table(&self, landing_name: &str) -> Result<()>;

    /// Create a landing table with the given columns, each as a wide text
    /// column. Column names are preserved exactly and quoted by the adapter.
    async fn create_table(&self, landing_name: &str, columns: &[String]) -> Result<()>;

    /// Insert a batch of rows with a single multi-row statement. Returns the
    /// number of rows written. Fails as a whole: either every row of the
    /// batch lands or none does.
    async fn insert_batch(
        &self,
        landing_name: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64>;

    /// Insert a single row (fallback path).
    async fn insert_row(&self, landing_name: &str, columns: &[String], row: &[String])
        -> Result<()>;

    /// Count the rows currently in a landing table.
    async fn count_rows(&self, landing_name: &str) -> Result<i64>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<()>;
}
