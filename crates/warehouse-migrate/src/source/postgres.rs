//! PostgreSQL-backed source adapter.
//!
//! Reads the legacy catalog through `information_schema` and samples rows
//! with a `LIMIT`ed select. Every selected column is cast to text on the
//! server side, so decoding never depends on source type metadata being
//! accurate. Dirty columns arrive as strings or NULL and nothing else.

use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;
use tracing::debug;

use crate::catalog::{ColumnDescriptor, TableDescriptor};
use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::source::{RawValue, SourceService, TableSample};

/// Quote a PostgreSQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Qualify a table name with its schema.
fn qualify(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Source service over a pooled PostgreSQL connection.
pub struct PostgresSource {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    schema: String,
}

impl PostgresSource {
    /// Connect and build a pool sized for the worker count.
    pub async fn connect(config: &SourceConfig, max_connections: u32) -> Result<Self> {
        let manager =
            PostgresConnectionManager::new_from_stringlike(config.connection_string(), NoTls)
                .map_err(|e| MigrateError::schema_read(format!("invalid source config: {e}")))?;

        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .map_err(|e| MigrateError::schema_read(format!("source pool error: {e}")))?;

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    async fn conn(
        &self,
    ) -> Result<bb8::PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::schema_read(format!("source connection error: {e}")))
    }
}

#[async_trait]
impl SourceService for PostgresSource {
    async fn list_tables(&self) -> Result<Vec<TableDescriptor>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT table_schema, table_name \
                 FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                &[&self.schema],
            )
            .await
            .map_err(|e| MigrateError::schema_read(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|r| TableDescriptor::base(r.get::<_, String>(0), r.get::<_, String>(1)))
            .collect())
    }

    async fn list_columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT column_name, ordinal_position \
                 FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
                &[&table.schema, &table.name],
            )
            .await
            .map_err(|e| MigrateError::schema_read(e.to_string()))?;

        if rows.is_empty() {
            return Err(MigrateError::schema_read(format!(
                "table {} has no columns in the catalog",
                table.full_name()
            )));
        }

        Ok(rows
            .iter()
            .map(|r| ColumnDescriptor::new(r.get::<_, String>(0), r.get::<_, i32>(1) as usize))
            .collect())
    }

    async fn read_sample(&self, table: &TableDescriptor, row_cap: usize) -> Result<TableSample> {
        let columns = self.list_columns(table).await?;

        let col_list = columns
            .iter()
            .map(|c| format!("{}::text", quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {} FROM {} LIMIT {}",
            col_list,
            qualify(&table.schema, &table.name),
            row_cap
        );
        debug!("{}: sampling up to {} rows", table.full_name(), row_cap);

        let conn = self.conn().await?;
        let db_rows = conn
            .query(&query, &[])
            .await
            .map_err(|e| MigrateError::extraction(table.full_name(), e.to_string()))?;

        let mut rows = Vec::with_capacity(db_rows.len());
        for db_row in &db_rows {
            let mut row = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let cell: Option<String> = db_row
                    .try_get(i)
                    .map_err(|e| MigrateError::extraction(table.full_name(), e.to_string()))?;
                row.push(match cell {
                    Some(text) => RawValue::Text(text),
                    None => RawValue::Null,
                });
            }
            rows.push(row);
        }

        Ok(TableSample { columns, rows })
    }

    async fn row_count(&self, table: &TableDescriptor) -> Result<i64> {
        let conn = self.conn().await?;
        let query = format!(
            "SELECT COUNT(*) FROM {}",
            qualify(&table.schema, &table.name)
        );
        let row = conn
            .query_one(&query, &[])
            .await
            .map_err(|e| MigrateError::extraction(table.full_name(), e.to_string()))?;
        Ok(row.get(0))
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::schema_read(e.to_string()))?;
        Ok(())
    }
}
