//! warehouse-migrate CLI - land legacy tables into the warehouse.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use warehouse_migrate::{Config, MigrateError, MigrationCoordinator};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "warehouse-migrate")]
#[command(about = "Batch migration of legacy tables into warehouse landing tables")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Print progress updates as JSON lines to stderr
    #[arg(long)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new migration
    Run {
        /// Override source schema
        #[arg(long)]
        source_schema: Option<String>,

        /// Override landing schema
        #[arg(long)]
        target_schema: Option<String>,

        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,

        /// Dry run: resolve the worklist and show the plan without touching
        /// the target
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare landing row counts against source counts
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(MigrateError::Config)?;

    let mut config = Config::load(&cli.config)?.with_auto_tuning();
    info!("Loaded configuration from {:?}", cli.config);

    // Setup signal handling for graceful shutdown (SIGINT and SIGTERM)
    let cancel_token = setup_signal_handler()?;

    match cli.command {
        Commands::Run {
            source_schema,
            target_schema,
            workers,
            dry_run,
        } => {
            // Apply overrides
            if let Some(schema) = source_schema {
                config.source.schema = schema;
            }
            if let Some(schema) = target_schema {
                config.target.schema = schema;
            }
            if let Some(w) = workers {
                config.migration.workers = Some(w);
            }

            let coordinator = MigrationCoordinator::new(config).await?;

            if dry_run {
                let plan = coordinator.plan().await?;
                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    println!("Dry run plan ({} tables):", plan.len());
                    for table in &plan {
                        match (&table.resolved_name, &table.error) {
                            (Some(resolved), _) => {
                                let rows = table
                                    .source_rows
                                    .map(|n| n.to_string())
                                    .unwrap_or_else(|| "?".to_string());
                                println!(
                                    "  {} -> {} -> {} ({} rows)",
                                    table.logical_name, resolved, table.landing_table, rows
                                );
                            }
                            (None, Some(err)) => {
                                println!("  {} -> UNRESOLVED: {}", table.logical_name, err)
                            }
                            (None, None) => {}
                        }
                    }
                }
                return Ok(());
            }

            // Forward progress events as JSON lines if requested
            let events = if cli.progress {
                let (tx, mut rx) = warehouse_migrate::events::channel();
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if let Ok(line) = serde_json::to_string(&event) {
                            eprintln!("{line}");
                        }
                    }
                });
                Some(tx)
            } else {
                None
            };

            let result = coordinator.run(cancel_token, events).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Tables: {}/{}", result.successful, result.tables_total);
                println!("  Rows loaded: {}", result.total_rows_loaded);
                if result.total_rows_skipped > 0 {
                    println!("  Rows skipped: {}", result.total_rows_skipped);
                }
                println!("  Success rate: {:.1}%", result.success_rate);
                let failed: Vec<_> = result
                    .outcomes
                    .iter()
                    .filter(|o| o.error.is_some())
                    .map(|o| o.logical_name.as_str())
                    .collect();
                if !failed.is_empty() {
                    println!("  Failed tables: {failed:?}");
                }
            }
        }

        Commands::Validate => {
            let coordinator = MigrationCoordinator::new(config).await?;
            let reports = coordinator.validate().await?;

            let mut mismatches = 0;
            for (landing, report) in &reports {
                if report.matches {
                    println!("  {} : {} rows (match)", landing, report.landing_count);
                } else {
                    mismatches += 1;
                    println!(
                        "  {} : landing={} expected={} (MISMATCH)",
                        landing, report.landing_count, report.reference_count
                    );
                }
            }
            println!(
                "\nValidation completed: {}/{} tables match",
                reports.len() - mismatches,
                reports.len()
            );
        }

        Commands::HealthCheck => {
            let coordinator = MigrationCoordinator::new(config).await?;
            let result = coordinator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source: {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::Config("Health check failed".to_string()));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM (Kubernetes/Airflow shutdown).
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    let token_term = cancel_token.clone();

    // SIGINT handler (Ctrl-C)
    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to setup SIGINT handler: {e}");
                return;
            }
        };
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Shutting down gracefully...");
        token_int.cancel();
    });

    // SIGTERM handler (Kubernetes/Airflow)
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to setup SIGTERM handler: {e}");
                return;
            }
        };
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Shutting down gracefully...");
        token_term.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only SIGINT/Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
