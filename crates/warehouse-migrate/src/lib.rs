//! # warehouse-migrate
//!
//! Batch migration of legacy relational tables into wide-text warehouse
//! landing tables.
//!
//! This library provides the core functionality for landing operational
//! tables from a legacy practice database into an analytics warehouse:
//!
//! - **Name resolution** from operator-supplied logical names to physical
//!   source tables, with confidence-ranked fuzzy matching
//! - **Row-capped extraction** so no single table dominates a run
//! - **Deterministic sanitization** of dirty legacy values into loader-safe
//!   text
//! - **Idempotent provisioning** of wide-text landing tables
//! - **Batch loading** with a per-row fallback that skips poison rows
//!   instead of failing tables
//! - **Parallel runs** on a bounded worker pool with cancellation
//!
//! ## Example
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use warehouse_migrate::{Config, MigrationCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> warehouse_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?.with_auto_tuning();
//!     let coordinator = MigrationCoordinator::new(config).await?;
//!     let result = coordinator.run(CancellationToken::new(), None).await?;
//!     println!("Loaded {} rows", result.total_rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod extract;
pub mod load;
pub mod provision;
pub mod resolver;
pub mod sanitize;
pub mod source;
pub mod target;
pub mod validate;

// Re-exports for convenient access
pub use catalog::{ColumnDescriptor, SchemaCatalog, TableDescriptor, TableKind};
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig, WorklistEntry};
pub use coordinator::{
    HealthReport, MigrationCoordinator, MigrationResult, PlannedTable, TaskOutcome, TaskStatus,
};
pub use error::{MigrateError, Result};
pub use events::{EventReceiver, EventSender, MigrationEvent};
pub use load::LoadReport;
pub use resolver::{Confidence, MatchCandidate};
pub use source::{MemorySource, PostgresSource, RawValue, SourceService, TableSample};
pub use target::{MemoryTarget, PostgresTarget, TargetService};
pub use validate::ValidationReport;
