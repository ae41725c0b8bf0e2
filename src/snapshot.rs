// 📂 Snapshots - one reporting year of employee records
// RawTable is the untyped CSV; CohortSnapshot is the normalized, typed view

use crate::config::ColumnMap;
use crate::error::CohortResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Columns the normalizer derives; never carried as source attributes
pub const DERIVED_COLUMNS: [&str; 2] = ["is_stagnant", "is_high_dual_risk"];

// ============================================================================
// RAW TABLE
// ============================================================================

/// RawTable - header row plus string cells, exactly as exported
///
/// No column is interpreted here. Short rows are padded with empty cells so
/// every row has `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Load a CSV export from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            "loaded CSV"
        );

        Ok(table)
    }

    /// Parse CSV with a header row from any reader
    pub fn from_reader<R: Read>(reader: R) -> CohortResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header (exact, case-sensitive match)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, column) or "" when out of range
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn write_to<W: Write>(&self, writer: W) -> CohortResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        self.write_to(file)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// SNAPSHOT ROLE
// ============================================================================

/// Which side of the year-over-year merge a snapshot sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotRole {
    Prior,
    Current,
}

impl fmt::Display for SnapshotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotRole::Prior => write!(f, "prior-year"),
            SnapshotRole::Current => write!(f, "current-year"),
        }
    }
}

// ============================================================================
// EMPLOYEE RECORD
// ============================================================================

/// EmployeeRecord - one employee in one reporting year, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: String,

    // Source text, kept as exported (classification trims/uppercases a copy)
    pub tenure_band: String,
    pub competence_level: String,
    pub talent_potential: String,
    pub attrition_risk: String,
    pub department: String,
    pub manager: String,

    /// Cleaned monetary value (0.0 when missing or unparseable)
    pub replacement_cost: f64,

    // Derived flags
    pub is_stagnant: bool,
    pub is_high_dual_risk: bool,

    /// Every other source column, in source order
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
}

impl EmployeeRecord {
    pub fn attribute(&self, header: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// COHORT SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSnapshot {
    /// Reporting year label ("2024")
    pub label: String,
    pub role: SnapshotRole,
    pub records: Vec<EmployeeRecord>,

    /// Headers of the carried attributes, in source order
    pub attribute_headers: Vec<String>,
}

impl CohortSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// "prior-year (2024)" - used in error messages and logs
    pub fn describe(&self) -> String {
        format!("{} ({})", self.role, self.label)
    }

    pub fn stagnant(&self) -> impl Iterator<Item = &EmployeeRecord> {
        self.records.iter().filter(|r| r.is_stagnant)
    }

    pub fn stagnant_count(&self) -> usize {
        self.stagnant().count()
    }

    pub fn high_dual_risk_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_high_dual_risk).count()
    }

    /// Render back to a table: mapped columns, attributes, then derived flags.
    ///
    /// The cost column holds the cleaned number, so normalizing the result
    /// again yields this same snapshot.
    pub fn to_raw_table(&self, columns: &ColumnMap) -> RawTable {
        let mut table = RawTable::new(table_headers(columns, &self.attribute_headers));
        for record in &self.records {
            table.rows.push(record_cells(record, &self.attribute_headers));
        }
        table
    }
}

/// Header row of a rendered snapshot; the id column always comes first
pub fn table_headers(columns: &ColumnMap, attribute_headers: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = columns
        .mapped_headers()
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend(attribute_headers.iter().cloned());
    headers.extend(DERIVED_COLUMNS.iter().map(|h| h.to_string()));
    headers
}

/// Cells of one record, aligned with `table_headers`
pub fn record_cells(record: &EmployeeRecord, attribute_headers: &[String]) -> Vec<String> {
    let mut row = vec![
        record.employee_id.clone(),
        record.tenure_band.clone(),
        record.competence_level.clone(),
        record.talent_potential.clone(),
        record.attrition_risk.clone(),
        record.replacement_cost.to_string(),
        record.department.clone(),
        record.manager.clone(),
    ];
    for header in attribute_headers {
        row.push(record.attribute(header).unwrap_or("").to_string());
    }
    row.push(record.is_stagnant.to_string());
    row.push(record.is_high_dual_risk.to_string());
    row
}

// ============================================================================
// TESTS
// ============================================================================
