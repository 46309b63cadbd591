//! Migration coordinator - main workflow driver.
//!
//! Walks each worklist entry through the table pipeline (discover, resolve,
//! extract, sanitize, provision, load, validate) on a bounded pool of
//! workers. Workers pull from a shared queue and report through a single
//! result channel, so per-run accounting happens in exactly one place.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::catalog::{SchemaCatalog, TableDescriptor};
use crate::config::{Config, WorklistEntry};
use crate::error::{MigrateError, Result};
use crate::events::{emit, EventSender, MigrationEvent};
use crate::extract::Extractor;
use crate::load::BatchLoader;
use crate::provision::{landing_table_name, Provisioner};
use crate::resolver::{self, Confidence};
use crate::sanitize::sanitize_rows;
use crate::source::{PostgresSource, SourceService};
use crate::target::{PostgresTarget, TargetService};
use crate::validate::{ValidationReport, Validator};

/// Pipeline state of one table task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Discovering,
    Resolving,
    Extracting,
    Sanitizing,
    Provisioning,
    Loading,
    Validated,
    Failed,
}

/// Final accounting for one worklist entry.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    /// Logical name as requested by the operator.
    pub logical_name: String,

    /// Physical source table resolution landed on, if it got that far.
    pub resolved_name: Option<String>,

    /// Resolution confidence, absent for overrides and failures.
    pub confidence: Option<Confidence>,

    /// Landing table name, once provisioning was attempted.
    pub landing_table: Option<String>,

    /// Where the pipeline ended.
    pub status: TaskStatus,

    /// Rows extracted after the cap.
    pub rows_total: u64,

    /// Rows that landed.
    pub rows_loaded: u64,

    /// Rows skipped by the fallback path.
    pub rows_skipped: u64,

    /// Count comparison, when validation ran.
    pub validation: Option<ValidationReport>,

    /// Error text for failed tasks.
    pub error: Option<String>,
}

impl TaskOutcome {
    fn new(logical_name: &str) -> Self {
        Self {
            logical_name: logical_name.to_string(),
            resolved_name: None,
            confidence: None,
            landing_table: None,
            status: TaskStatus::Pending,
            rows_total: 0,
            rows_loaded: 0,
            rows_skipped: 0,
            validation: None,
            error: None,
        }
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Worklist entries processed.
    pub tables_total: usize,

    /// Tasks that reached Validated.
    pub successful: usize,

    /// Tasks that did not.
    pub failed: usize,

    /// Rows landed across all tables.
    pub total_rows_loaded: u64,

    /// Rows skipped across all tables.
    pub total_rows_skipped: u64,

    /// successful / tables_total, in percent.
    pub success_rate: f64,

    /// Per-table outcomes, in completion order.
    pub outcomes: Vec<TaskOutcome>,
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connectivity probe results for both sides.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// One planned table from a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTable {
    pub logical_name: String,
    pub resolved_name: Option<String>,
    pub confidence: Option<Confidence>,
    pub landing_table: String,
    /// Pre-cap source row count, when resolution succeeded.
    pub source_rows: Option<i64>,
    pub error: Option<String>,
}

/// Everything a worker needs, shared across the pool.
struct PipelineContext {
    source: Arc<dyn SourceService>,
    target: Arc<dyn TargetService>,
    catalog: Arc<Vec<TableDescriptor>>,
    source_schema: String,
    row_cap: usize,
    batch_size: usize,
    max_cell_len: usize,
    call_timeout: Duration,
    validate: bool,
    cancel: CancellationToken,
    events: Option<EventSender>,
}

/// Migration coordinator.
pub struct MigrationCoordinator {
    config: Config,
    source: Arc<dyn SourceService>,
    target: Arc<dyn TargetService>,
}

impl MigrationCoordinator {
    /// Create a coordinator with pooled PostgreSQL adapters on both sides.
    pub async fn new(config: Config) -> Result<Self> {
        let workers = config.migration.get_workers() as u32;
        let source = PostgresSource::connect(&config.source, workers + 1).await?;
        let target = PostgresTarget::connect(&config.target, workers + 1).await?;

        Ok(Self {
            config,
            source: Arc::new(source),
            target: Arc::new(target),
        })
    }

    /// Create a coordinator over caller-supplied services.
    pub fn with_services(
        config: Config,
        source: Arc<dyn SourceService>,
        target: Arc<dyn TargetService>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Probe connectivity on both sides, measuring round-trip latency.
    pub async fn health_check(&self) -> HealthReport {
        let call_timeout = self.call_timeout();

        let start = std::time::Instant::now();
        let source = timed(call_timeout, "ping source", self.source.ping()).await;
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = std::time::Instant::now();
        let target = timed(call_timeout, "ping target", self.target.ping()).await;
        let target_latency_ms = start.elapsed().as_millis() as u64;

        let healthy = source.is_ok() && target.is_ok();
        if healthy {
            info!("Source and target are reachable");
        }

        HealthReport {
            source_connected: source.is_ok(),
            source_latency_ms,
            source_error: source.err().map(|e| e.to_string()),
            target_connected: target.is_ok(),
            target_latency_ms,
            target_error: target.err().map(|e| e.to_string()),
            healthy,
        }
    }

    /// Resolve the worklist without touching the target.
    pub async fn plan(&self) -> Result<Vec<PlannedTable>> {
        let call_timeout = self.call_timeout();
        let catalog = timed(
            call_timeout,
            "discover source catalog",
            SchemaCatalog::new(self.source.clone()).list_tables(),
        )
        .await?;
        let schema = &self.config.source.schema;

        let mut planned = Vec::new();
        for entry in &self.worklist(&catalog) {
            let landing_table = landing_table_name(schema, &entry.table);
            match resolve_entry(entry, &catalog) {
                Ok((descriptor, confidence)) => {
                    let source_rows = timed(
                        call_timeout,
                        &format!("count {}", descriptor.full_name()),
                        self.source.row_count(&descriptor),
                    )
                    .await
                    .ok();
                    planned.push(PlannedTable {
                        logical_name: entry.table.clone(),
                        resolved_name: Some(descriptor.full_name()),
                        confidence,
                        landing_table,
                        source_rows,
                        error: None,
                    });
                }
                Err(e) => planned.push(PlannedTable {
                    logical_name: entry.table.clone(),
                    resolved_name: None,
                    confidence: None,
                    landing_table,
                    source_rows: None,
                    error: Some(e.to_string()),
                }),
            }
        }
        Ok(planned)
    }

    /// An empty worklist means every discovered table, under its own name.
    fn worklist(&self, catalog: &[TableDescriptor]) -> Vec<WorklistEntry> {
        if self.config.tables.is_empty() {
            catalog
                .iter()
                .map(|t| WorklistEntry::new(t.name.clone()))
                .collect()
        } else {
            self.config.tables.clone()
        }
    }

    /// Run the migration.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        events: Option<EventSender>,
    ) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {}", run_id);

        let catalog = Arc::new(
            timed(
                self.call_timeout(),
                "discover source catalog",
                SchemaCatalog::new(self.source.clone()).list_tables(),
            )
            .await?,
        );
        let entries = self.worklist(&catalog);
        let workers = self.config.migration.get_workers().max(1).min(entries.len().max(1));
        info!(
            "Migrating {} tables with {} workers",
            entries.len(),
            workers
        );

        let ctx = Arc::new(PipelineContext {
            source: self.source.clone(),
            target: self.target.clone(),
            catalog,
            source_schema: self.config.source.schema.clone(),
            row_cap: self.config.migration.row_cap,
            batch_size: self.config.migration.batch_size,
            max_cell_len: self.config.migration.max_cell_len,
            call_timeout: self.call_timeout(),
            validate: self.config.migration.validate,
            cancel: cancel.clone(),
            events,
        });

        let (task_tx, task_rx) = async_channel::bounded::<WorklistEntry>(entries.len().max(1));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TaskOutcome>();

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                while let Ok(entry) = rx.recv().await {
                    let outcome = run_pipeline(&ctx, &entry).await;
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        let total = entries.len();
        for entry in entries {
            // Queue capacity equals the worklist length, so this never blocks.
            if task_tx.send(entry).await.is_err() {
                break;
            }
        }
        task_tx.close();

        // Single sync point: every outcome funnels through this loop.
        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = result_rx.recv().await {
            outcomes.push(outcome);
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {}", e);
            }
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let successful = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Validated)
            .count();
        let failed = total - successful;
        let total_rows_loaded: u64 = outcomes.iter().map(|o| o.rows_loaded).sum();
        let total_rows_skipped: u64 = outcomes.iter().map(|o| o.rows_skipped).sum();
        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            100.0
        };

        emit(
            ctx.events.as_ref(),
            MigrationEvent::RunCompleted {
                successful,
                failed,
                total_rows_loaded,
            },
        );
        info!(
            "Migration run {}: {}/{} tables, {} rows in {:.1}s ({:.1}% success)",
            run_id, successful, total, total_rows_loaded, duration, success_rate
        );

        Ok(MigrationResult {
            run_id,
            started_at,
            completed_at,
            duration_seconds: duration,
            tables_total: total,
            successful,
            failed,
            total_rows_loaded,
            total_rows_skipped,
            success_rate,
            outcomes,
        })
    }

    /// Re-run validation for every worklist entry against current counts.
    pub async fn validate(&self) -> Result<Vec<(String, ValidationReport)>> {
        let call_timeout = self.call_timeout();
        let catalog = timed(
            call_timeout,
            "discover source catalog",
            SchemaCatalog::new(self.source.clone()).list_tables(),
        )
        .await?;
        let schema = &self.config.source.schema;
        let validator = Validator::new(self.target.clone());

        let mut reports = Vec::new();
        for entry in &self.worklist(&catalog) {
            let (descriptor, _) = resolve_entry(entry, &catalog)?;
            let source_count = timed(
                call_timeout,
                &format!("count {}", descriptor.full_name()),
                self.source.row_count(&descriptor),
            )
            .await?;
            let reference = source_count.min(self.config.migration.row_cap as i64);

            let landing = landing_table_name(schema, &entry.table);
            let report = timed(
                call_timeout,
                &format!("validate {landing}"),
                validator.validate(&landing, reference),
            )
            .await?;
            reports.push((landing, report));
        }
        Ok(reports)
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.migration.call_timeout_secs)
    }
}

/// Resolve one worklist entry against the discovered catalog.
///
/// An override pins the physical table by exact name and carries no
/// confidence. Without an override the resolver ranks candidates and the
/// first one wins.
fn resolve_entry(
    entry: &WorklistEntry,
    catalog: &[TableDescriptor],
) -> Result<(TableDescriptor, Option<Confidence>)> {
    if let Some(ref name) = entry.override_name {
        return catalog
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| (t.clone(), None))
            .ok_or_else(|| {
                MigrateError::NotFound(format!(
                    "override table '{}' for '{}' not in source catalog",
                    name, entry.table
                ))
            });
    }

    let candidates = resolver::resolve(&entry.table, catalog);
    resolver::auto_select(&candidates)
        .map(|c| (c.descriptor.clone(), Some(c.confidence)))
        .ok_or_else(|| {
            MigrateError::NotFound(format!("no source table matches '{}'", entry.table))
        })
}

/// Wrap a service call with the configured per-call timeout.
async fn timed<T>(
    limit: Duration,
    what: &str,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(MigrateError::Timeout(what.to_string())),
    }
}

/// Drive one table through the pipeline, always producing an outcome.
async fn run_pipeline(ctx: &PipelineContext, entry: &WorklistEntry) -> TaskOutcome {
    let mut outcome = TaskOutcome::new(&entry.table);
    emit(
        ctx.events.as_ref(),
        MigrationEvent::TaskStarted {
            logical_name: entry.table.clone(),
        },
    );

    match drive(ctx, entry, &mut outcome).await {
        Ok(()) => {
            emit(
                ctx.events.as_ref(),
                MigrationEvent::TaskCompleted {
                    logical_name: outcome.logical_name.clone(),
                    landing_table: outcome.landing_table.clone().unwrap_or_default(),
                    rows_loaded: outcome.rows_loaded,
                    rows_skipped: outcome.rows_skipped,
                },
            );
        }
        Err(e) => {
            // Loading absorbs row failures; an error there is cancellation
            // or an infrastructure fault, not a pipeline failure state.
            if outcome.status != TaskStatus::Loading {
                outcome.status = TaskStatus::Failed;
            }
            outcome.error = Some(e.to_string());
            warn!("{}: {}", entry.table, e);
            emit(
                ctx.events.as_ref(),
                MigrationEvent::TaskFailed {
                    logical_name: outcome.logical_name.clone(),
                    error: e.to_string(),
                },
            );
        }
    }
    outcome
}

async fn drive(
    ctx: &PipelineContext,
    entry: &WorklistEntry,
    outcome: &mut TaskOutcome,
) -> Result<()> {
    if ctx.cancel.is_cancelled() {
        return Err(MigrateError::Cancelled);
    }

    outcome.status = TaskStatus::Discovering;
    if ctx.catalog.is_empty() {
        return Err(MigrateError::schema_read("source catalog is empty"));
    }

    outcome.status = TaskStatus::Resolving;
    let (descriptor, confidence) = resolve_entry(entry, &ctx.catalog)?;
    outcome.resolved_name = Some(descriptor.full_name());
    outcome.confidence = confidence;
    if let Some(confidence) = confidence {
        emit(
            ctx.events.as_ref(),
            MigrationEvent::TaskResolved {
                logical_name: entry.table.clone(),
                resolved_name: descriptor.full_name(),
                confidence,
            },
        );
    }

    outcome.status = TaskStatus::Extracting;
    let extractor = Extractor::new(ctx.source.clone(), ctx.row_cap);
    let extraction = timed(
        ctx.call_timeout,
        &format!("extract {}", descriptor.full_name()),
        extractor.extract(&descriptor),
    )
    .await?;
    outcome.rows_total = extraction.sample.len() as u64;
    if extraction.source_count > extraction.sample.len() as i64 {
        info!(
            "{}: capped at {} of {} rows",
            descriptor.full_name(),
            extraction.sample.len(),
            extraction.source_count
        );
    }

    outcome.status = TaskStatus::Sanitizing;
    let clean_rows = sanitize_rows(&extraction.sample, ctx.max_cell_len);

    outcome.status = TaskStatus::Provisioning;
    let landing = landing_table_name(&ctx.source_schema, &entry.table);
    outcome.landing_table = Some(landing.clone());
    let provisioner = Provisioner::new(ctx.target.clone());
    let columns = timed(
        ctx.call_timeout,
        &format!("provision {landing}"),
        provisioner.provision(&landing, &extraction.sample.columns),
    )
    .await?;

    // An empty table still lands as structure; there is nothing to load.
    if !clean_rows.is_empty() {
        outcome.status = TaskStatus::Loading;
        let loader = BatchLoader::new(ctx.target.clone(), ctx.batch_size, ctx.call_timeout);
        let report = loader
            .load(&landing, &columns, &clean_rows, &ctx.cancel, ctx.events.as_ref())
            .await?;
        outcome.rows_loaded = report.rows_loaded;
        outcome.rows_skipped = report.rows_skipped;
    }

    if ctx.validate {
        let validator = Validator::new(ctx.target.clone());
        let report = timed(
            ctx.call_timeout,
            &format!("validate {landing}"),
            validator.validate(&landing, outcome.rows_total as i64),
        )
        .await?;
        outcome.validation = Some(report);
    }

    outcome.status = TaskStatus::Validated;
    Ok(())
}
