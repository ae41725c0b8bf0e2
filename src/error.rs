// ⚠️ Cohort Errors - fatal conditions of the normalize/merge pipeline
// Unparseable money is NOT an error here: it collapses to 0.0 in the normalizer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CohortError {
    /// A mandatory column is absent from one of the snapshots
    #[error("missing mandatory column '{column}' in {snapshot} snapshot")]
    MissingColumn { column: String, snapshot: String },

    /// The current-year side of the merge must have unique ids
    #[error("duplicate employee id '{id}' in {snapshot} snapshot; duplicate join targets are unsupported")]
    DuplicateEmployeeId { id: String, snapshot: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CohortResult<T> = std::result::Result<T, CohortError>;
