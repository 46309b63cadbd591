//! PostgreSQL-backed target adapter.
//!
//! Provisions wide-text landing tables in the configured warehouse schema
//! and loads rows with literal multi-row INSERT statements. Cell values are
//! expected to be sanitizer output: already escaped for single quotes and
//! free of line breaks, so they can be embedded as SQL string literals.

use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;
use tracing::debug;

use crate::config::TargetConfig;
use crate::error::{MigrateError, Result};
use crate::target::TargetService;

/// Quote a PostgreSQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Target service over a pooled PostgreSQL connection.
pub struct PostgresTarget {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    schema: String,
}

impl PostgresTarget {
    /// Connect and build a pool sized for the worker count.
    pub async fn connect(config: &TargetConfig, max_connections: u32) -> Result<Self> {
        let manager =
            PostgresConnectionManager::new_from_stringlike(config.connection_string(), NoTls)
                .map_err(|e| {
                    MigrateError::Config(format!("invalid target config: {e}"))
                })?;

        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .map_err(|e| MigrateError::Config(format!("target pool error: {e}")))?;

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
            .map_err(|e| MigrateError::load("target", format!("connection error: {e}")))
    }

    fn qualified(&self, landing_name: &str) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(landing_name))
    }

    fn insert_sql(&self, landing_name: &str, columns: &[String], rows: &[Vec<String>]) -> String {
        let col_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let values = rows
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({cells})")
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.qualified(landing_name),
            col_list,
            values
        )
    }
}

#[async_trait]
impl TargetService for PostgresTarget {
    async fn drop_table(&self, landing_name: &str) -> Result<()> {
        let conn = self.conn().await?;
        let sql = format!("DROP TABLE IF EXISTS {}", self.qualified(landing_name));
        conn.execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::provision(landing_name, e.to_string()))?;
        Ok(())
    }

    async fn create_table(&self, landing_name: &str, columns: &[String]) -> Result<()> {
        let col_defs = columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE TABLE {} ({})",
            self.qualified(landing_name),
            col_defs
        );
        debug!("{}: creating landing table with {} columns", landing_name, columns.len());

        let conn = self.conn().await?;
        conn.execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::provision(landing_name, e.to_string()))?;
        Ok(())
    }

    async fn insert_batch(
        &self,
        landing_name: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = self.insert_sql(landing_name, columns, rows);
        let conn = self.conn().await?;
        conn.execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::load(landing_name, e.to_string()))
    }

    async fn insert_row(
        &self,
        landing_name: &str,
        columns: &[String],
        row: &[String],
    ) -> Result<()> {
        let single = [row.to_vec()];
        let sql = self.insert_sql(landing_name, columns, &single);
        let conn = self.conn().await?;
        conn.execute(&sql, &[])
            .await
            .map_err(|e| MigrateError::row(landing_name, e.to_string()))?;
        Ok(())
    }

    async fn count_rows(&self, landing_name: &str) -> Result<i64> {
        let conn = self.conn().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.qualified(landing_name));
        let row = conn
            .query_one(&sql, &[])
            .await
            .map_err(|e| MigrateError::load(landing_name, e.to_string()))?;
        Ok(row.get(0))
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::load("target", e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Name"), "\"Name\"");
        assert_eq!(quote_ident("odd\"col"), "\"odd\"\"col\"");
    }
}
