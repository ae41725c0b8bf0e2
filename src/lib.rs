// Workforce Insights - Core Library
// Exposes the cohort pipeline for the CLI, the TUI, the API server and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod snapshot;       // Raw CSV tables + normalized snapshots
pub mod normalizer;     // Cohort flags + money cleanup
pub mod merger;         // Year-over-year left join
pub mod analysis;       // normalize both years → merge
pub mod insights;       // Dashboard numbers
pub mod cache;          // Content-hash memoization
pub mod anonymize;      // PII scrubbing for shared exports

// Re-export commonly used types
pub use config::{ColumnMap, DashboardConfig, CONFIG_ENV_VAR};
pub use error::{CohortError, CohortResult};
pub use snapshot::{CohortSnapshot, EmployeeRecord, RawTable, SnapshotRole};
pub use normalizer::{
    is_high_dual_risk, is_stagnant, parse_money, Normalizer,
    EARLY_COMPETENCE_MARKERS, ELEVATED_RISK_MARKERS, HIGH_POTENTIAL_MARKERS, LONG_TENURE_MARKERS,
};
pub use merger::{CohortMerger, MergedRow, MergedView, RetentionStatus, RiskMitigation};
pub use analysis::Analysis;
pub use insights::{
    format_money, DepartmentTrend, GroupCount, HeadlineKpis, HiddenGem, InsightReport,
    StagnationBreakout,
};
pub use cache::AnalysisCache;
pub use anonymize::{anonymize_file, anonymize_table, AnonymizeSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
