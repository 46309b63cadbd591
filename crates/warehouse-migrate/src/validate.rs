//! Post-load validation.
//!
//! Compares the landing table row count against the count the pipeline
//! expected to land. Observational only: a mismatch is recorded and
//! reported, never treated as a failure.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::target::TargetService;

/// Outcome of a count comparison for one landing table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    /// Rows found in the landing table.
    pub landing_count: i64,
    /// Rows the pipeline expected after capping and skipping.
    pub reference_count: i64,
    pub matches: bool,
}

/// Checks landing tables against expected counts.
pub struct Validator {
    target: Arc<dyn TargetService>,
}

impl Validator {
    pub fn new(target: Arc<dyn TargetService>) -> Self {
        Self { target }
    }

    /// Count rows in `landing_name` and compare to `reference_count`.
    pub async fn validate(
        &self,
        landing_name: &str,
        reference_count: i64,
    ) -> Result<ValidationReport> {
        let landing_count = self.target.count_rows(landing_name).await?;
        let matches = landing_count == reference_count;

        if !matches {
            warn!(
                "{}: landing count {} does not match expected {}",
                landing_name, landing_count, reference_count
            );
        }

        Ok(ValidationReport {
            landing_count,
            reference_count,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::memory::MemoryTarget;
    use crate::target::TargetService as _;

    #[tokio::test]
    async fn test_matching_counts_validate() {
        let target = Arc::new(MemoryTarget::new());
        let cols: Vec<String> = vec!["V".into()];
        target.create_table("DBO_T", &cols).await.unwrap();
        target.insert_row("DBO_T", &cols, &["a".into()]).await.unwrap();
        target.insert_row("DBO_T", &cols, &["b".into()]).await.unwrap();

        let report = Validator::new(target).validate("DBO_T", 2).await.unwrap();
        assert!(report.matches);
        assert_eq!(report.landing_count, 2);
    }

    #[tokio::test]
    async fn test_mismatch_is_reported_not_failed() {
        let target = Arc::new(MemoryTarget::new());
        let cols: Vec<String> = vec!["V".into()];
        target.create_table("DBO_T", &cols).await.unwrap();

        let report = Validator::new(target).validate("DBO_T", 5).await.unwrap();
        assert!(!report.matches);
        assert_eq!(report.landing_count, 0);
        assert_eq!(report.reference_count, 5);
    }
}
