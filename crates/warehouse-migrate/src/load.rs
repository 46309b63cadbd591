//! Batch loading into landing tables.
//!
//! Rows go in as multi-row batches for throughput. When a batch is rejected
//! the loader retries its rows one at a time so a single poison row costs
//! one skip instead of the whole batch. Loading never fails a table: every
//! outcome is accounted for in the report.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::events::{emit, EventSender, MigrationEvent};
use crate::target::TargetService;

/// What happened to the rows of one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_loaded: u64,
    pub rows_skipped: u64,
}

/// Loads sanitized rows into a landing table in batches.
pub struct BatchLoader {
    target: Arc<dyn TargetService>,
    batch_size: usize,
    call_timeout: Duration,
}

impl BatchLoader {
    pub fn new(
        target: Arc<dyn TargetService>,
        batch_size: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            target,
            batch_size,
            call_timeout,
        }
    }

    /// Load `rows` into `landing_name`, batch by batch.
    ///
    /// A rejected batch falls back to single-row inserts; rows rejected
    /// individually are counted as skipped and the load continues. Returns
    /// an error only for cancellation, a timed-out insert, or failures that
    /// are not row-level rejections.
    pub async fn load(
        &self,
        landing_name: &str,
        columns: &[String],
        rows: &[Vec<String>],
        cancel: &CancellationToken,
        events: Option<&EventSender>,
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for batch in rows.chunks(self.batch_size.max(1)) {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            // Each insert is individually bounded so a stalled target cannot
            // hang the load between cancellation checks.
            let inserted = tokio::time::timeout(
                self.call_timeout,
                self.target.insert_batch(landing_name, columns, batch),
            )
            .await
            .map_err(|_| MigrateError::Timeout(format!("insert batch into {landing_name}")))?;

            match inserted {
                Ok(n) => report.rows_loaded += n,
                Err(MigrateError::Load { .. }) => {
                    debug!(
                        "{}: batch of {} rejected, retrying row by row",
                        landing_name,
                        batch.len()
                    );
                    let fallback = self.load_one_by_one(landing_name, columns, batch).await?;
                    report.rows_loaded += fallback.rows_loaded;
                    report.rows_skipped += fallback.rows_skipped;
                }
                Err(e) => return Err(e),
            }

            emit(
                events,
                MigrationEvent::BatchLoaded {
                    landing_table: landing_name.to_string(),
                    rows_loaded: report.rows_loaded,
                    rows_skipped: report.rows_skipped,
                },
            );
        }

        if report.rows_skipped > 0 {
            warn!(
                "{}: skipped {} of {} rows",
                landing_name,
                report.rows_skipped,
                rows.len()
            );
        }
        Ok(report)
    }

    async fn load_one_by_one(
        &self,
        landing_name: &str,
        columns: &[String],
        batch: &[Vec<String>],
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for row in batch {
            let inserted = tokio::time::timeout(
                self.call_timeout,
                self.target.insert_row(landing_name, columns, row),
            )
            .await
            .map_err(|_| MigrateError::Timeout(format!("insert row into {landing_name}")))?;

            match inserted {
                Ok(()) => report.rows_loaded += 1,
                Err(MigrateError::Row { .. }) => report.rows_skipped += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}
