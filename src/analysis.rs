// 🧮 Analysis Pipeline - load → normalize (both years) → merge
// Pure over in-memory tables; file helpers only add I/O and context

use crate::config::DashboardConfig;
use crate::error::CohortResult;
use crate::merger::{CohortMerger, MergedView};
use crate::normalizer::Normalizer;
use crate::snapshot::{CohortSnapshot, RawTable, SnapshotRole};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Both normalized snapshots plus their year-over-year merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub prior: CohortSnapshot,
    pub current: CohortSnapshot,
    pub merged: MergedView,
}

impl Analysis {
    /// Run the pipeline over two already-parsed tables
    pub fn from_tables(
        prior: &RawTable,
        current: &RawTable,
        config: &DashboardConfig,
    ) -> CohortResult<Self> {
        let normalizer = Normalizer::new(config.columns.clone());

        let prior = normalizer.normalize(prior, &config.prior_label, SnapshotRole::Prior)?;
        let current = normalizer.normalize(current, &config.current_label, SnapshotRole::Current)?;
        let merged = CohortMerger::merge(&prior, &current)?;

        Ok(Analysis {
            prior,
            current,
            merged,
        })
    }

    /// Run the pipeline over CSV bytes (uploads)
    pub fn from_csv_bytes(
        prior: &[u8],
        current: &[u8],
        config: &DashboardConfig,
    ) -> CohortResult<Self> {
        let prior = RawTable::from_reader(Cursor::new(prior))?;
        let current = RawTable::from_reader(Cursor::new(current))?;
        Self::from_tables(&prior, &current, config)
    }

    /// Run the pipeline over two CSV files
    pub fn from_paths(prior: &Path, current: &Path, config: &DashboardConfig) -> Result<Self> {
        let prior_table = RawTable::from_path(prior)?;
        let current_table = RawTable::from_path(current)?;

        Self::from_tables(&prior_table, &current_table, config).with_context(|| {
            format!(
                "Failed to analyze {} against {}",
                prior.display(),
                current.display()
            )
        })
    }

    /// Flattened merged view with year-suffixed columns
    pub fn merged_table(&self, config: &DashboardConfig) -> RawTable {
        self.merged.to_raw_table(
            &config.columns,
            &config.prior_suffix(),
            &config.current_suffix(),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CohortError;

    const PRIOR: &str = "\
Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager,Employee replacement
1,5+ years,Starter 1,KEY,HIGH,Ops,Alice,\"10,000\"
2,1-2,LEAD,SOLID,LOW,Ops,Alice,5000
7,>4,SPECIALIST,STAR,MEDIUM,R&D,Bob,$2500
";

    const CURRENT: &str = "\
Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager,Employee replacement
1,5+ years,Starter 2,KEY,LOW,Ops,Carol,10000
2,1-2,LEAD,SOLID,LOW,Ops,Alice,5000
";

    #[test]
    fn test_from_csv_bytes() {
        let analysis =
            Analysis::from_csv_bytes(PRIOR.as_bytes(), CURRENT.as_bytes(), &DashboardConfig::default())
                .unwrap();

        assert_eq!(analysis.prior.len(), 3);
        assert_eq!(analysis.current.len(), 2);
        assert_eq!(analysis.merged.len(), 3);
        assert_eq!(analysis.merged.left_count(), 1);
        assert_eq!(analysis.merged.rows[2].employee_id(), "7");
        assert_eq!(analysis.prior.records[2].replacement_cost, 2500.0);
    }

    #[test]
    fn test_missing_column_names_current_snapshot() {
        let broken = "Team member ID,Competence\n1,STARTER1\n";
        let err = Analysis::from_csv_bytes(
            PRIOR.as_bytes(),
            broken.as_bytes(),
            &DashboardConfig::default(),
        )
        .unwrap_err();

        match err {
            CohortError::MissingColumn { column, snapshot } => {
                assert_eq!(column, "Time in Role (Range)");
                assert!(snapshot.starts_with("current-year"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_merged_table_suffixes_follow_labels() {
        let mut config = DashboardConfig::default();
        config.prior_label = "2023".to_string();
        config.current_label = "2024".to_string();

        let analysis =
            Analysis::from_csv_bytes(PRIOR.as_bytes(), CURRENT.as_bytes(), &config).unwrap();
        let table = analysis.merged_table(&config);

        assert!(table.column_index("Manager_23").is_some());
        assert!(table.column_index("Manager_24").is_some());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        let prior = dir.path().join("2024.csv");
        let current = dir.path().join("2025.csv");
        std::fs::write(&prior, PRIOR).unwrap();
        std::fs::write(&current, CURRENT).unwrap();

        let analysis = Analysis::from_paths(&prior, &current, &DashboardConfig::default()).unwrap();
        assert_eq!(analysis.merged.retained_count(), 2);
    }
}
