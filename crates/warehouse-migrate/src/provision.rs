//! Landing table provisioning.
//!
//! Derives the warehouse landing name from the logical identity of a table
//! and recreates the landing table from scratch on every run: drop if
//! present, then create with one wide text column per source column.

use std::sync::Arc;

use tracing::info;

use crate::catalog::ColumnDescriptor;
use crate::error::Result;
use crate::target::TargetService;

/// Derive the landing-table name for a logical table.
///
/// `("dbo", "Patient")` becomes `DBO_PATIENT`. The name is a function of
/// the logical identity, not of whatever physical table resolution picked,
/// so reruns land in the same place even when resolution drifts.
pub fn landing_table_name(schema: &str, logical_name: &str) -> String {
    format!("{schema}_{logical_name}").to_uppercase()
}

/// Drops and recreates landing tables.
pub struct Provisioner {
    target: Arc<dyn TargetService>,
}

impl Provisioner {
    pub fn new(target: Arc<dyn TargetService>) -> Self {
        Self { target }
    }

    /// Recreate `landing_name` with the given columns, in source order.
    ///
    /// Idempotent: a leftover table from a previous run is dropped first,
    /// so repeated runs converge on the same structure regardless of what
    /// the prior run left behind.
    pub async fn provision(
        &self,
        landing_name: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<String>> {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        self.target.drop_table(landing_name).await?;
        self.target.create_table(landing_name, &names).await?;
        info!("{}: provisioned with {} columns", landing_name, names.len());

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::memory::MemoryTarget;

    #[test]
    fn test_landing_name_is_uppercased_schema_and_logical() {
        assert_eq!(landing_table_name("dbo", "Patient"), "DBO_PATIENT");
        assert_eq!(
            landing_table_name("billing", "InvoiceDetail"),
            "BILLING_INVOICEDETAIL"
        );
    }

    #[tokio::test]
    async fn test_provision_recreates_with_new_structure() {
        let target = Arc::new(MemoryTarget::new());
        let provisioner = Provisioner::new(target.clone());

        let three: Vec<ColumnDescriptor> = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, n)| ColumnDescriptor::new(*n, i + 1))
            .collect();
        provisioner.provision("DBO_T", &three).await.unwrap();
        target
            .insert_row(
                "DBO_T",
                &["A".into(), "B".into(), "C".into()],
                &["1".into(), "2".into(), "3".into()],
            )
            .await
            .unwrap();

        let five: Vec<ColumnDescriptor> = ["A", "B", "C", "D", "E"]
            .iter()
            .enumerate()
            .map(|(i, n)| ColumnDescriptor::new(*n, i + 1))
            .collect();
        let names = provisioner.provision("DBO_T", &five).await.unwrap();

        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(target.columns_of("DBO_T").unwrap(), names);
        assert_eq!(target.count_rows("DBO_T").await.unwrap(), 0);
    }
}
