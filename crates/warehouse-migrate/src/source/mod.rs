//! Source catalog/query service.
//!
//! The engine reads the legacy source exclusively through [`SourceService`]:
//! list base tables, list columns, run a row-capped sample read, and count
//! rows. Connection-string construction and credentials are the adapter's
//! concern, not the engine's.

pub mod memory;
pub mod postgres;

pub use memory::MemorySource;
pub use postgres::PostgresSource;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::catalog::{ColumnDescriptor, TableDescriptor};
use crate::error::Result;

/// A raw cell value as read from the source, before sanitization.
///
/// The engine intentionally collapses everything to text downstream; this
/// enum only exists so the sanitizer can distinguish absence (null, NaN)
/// from real values and render the rest deterministically.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL or an equivalent missing marker.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl RawValue {
    /// Check whether this value represents absence: NULL or a non-finite
    /// float (NaN from dirty numeric columns).
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

/// Result of a bounded sample read: columns in ordinal order plus raw rows.
///
/// Every row has exactly one cell per column; a shorter or longer row is a
/// source-adapter bug, not something downstream code tolerates.
#[derive(Debug, Clone)]
pub struct TableSample {
    /// Columns in source ordinal order.
    pub columns: Vec<ColumnDescriptor>,

    /// Raw rows, at most `row_cap` of them.
    pub rows: Vec<Vec<RawValue>>,
}

impl TableSample {
    /// Number of rows captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the sample holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-side interface to the legacy source.
#[async_trait]
pub trait SourceService: Send + Sync {
    /// List base tables with schema and name.
    async fn list_tables(&self) -> Result<Vec<TableDescriptor>>;

    /// List columns for a discovered table.
    async fn list_columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>>;

    /// Run a single bounded read capped at `row_cap` rows. No pagination;
    /// which subset survives the cap on a larger table is unspecified.
    async fn read_sample(&self, table: &TableDescriptor, row_cap: usize) -> Result<TableSample>;

    /// Get the full (pre-cap) row count of a table.
    async fn row_count(&self, table: &TableDescriptor) -> Result<i64>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<()>;
}
