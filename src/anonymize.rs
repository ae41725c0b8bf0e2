// 🕶️ Anonymizer - replace PII columns with consistent pseudonyms
// Offline prep step run on raw exports before they are shared

use crate::config::ColumnMap;
use crate::snapshot::RawTable;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const EMAIL_COLUMN: &str = "email";
pub const INTERNAL_ID_COLUMN: &str = "iba-id";
pub const HRBP_COLUMN: &str = "hrbp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizeSummary {
    pub rows: usize,
    pub columns: usize,
    pub managers: usize,
}

/// Spreadsheet-style letters: 0 → A, 25 → Z, 26 → AA
pub fn letter_code(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn ensure_column(table: &mut RawTable, name: &str) -> usize {
    match table.column_index(name) {
        Some(i) => i,
        None => {
            table.headers.push(name.to_string());
            for row in &mut table.rows {
                row.push(String::new());
            }
            table.headers.len() - 1
        }
    }
}

/// Map each distinct value to `{prefix} {letter}` in order of first appearance
fn pseudonymize_by_first_appearance(table: &mut RawTable, column: usize, prefix: &str) -> usize {
    let mut mapping: HashMap<String, String> = HashMap::new();

    for row in &mut table.rows {
        let next = mapping.len();
        let alias = mapping
            .entry(row[column].clone())
            .or_insert_with(|| format!("{} {}", prefix, letter_code(next)));
        row[column] = alias.clone();
    }

    mapping.len()
}

/// Anonymize a table in place
pub fn anonymize_table(table: &mut RawTable, columns: &ColumnMap) -> Result<AnonymizeSummary> {
    let manager = table
        .column_index(&columns.manager)
        .ok_or_else(|| anyhow!("Column '{}' not found; cannot anonymize managers", columns.manager))?;

    let first_name = ensure_column(table, &columns.first_name);
    let last_name = ensure_column(table, &columns.last_name);

    for (index, row) in table.rows.iter_mut().enumerate() {
        row[first_name] = "Employee".to_string();
        row[last_name] = format!("{:03}", index);
    }

    let managers = pseudonymize_by_first_appearance(table, manager, "Manager");

    if let Some(email) = table.column_index(EMAIL_COLUMN) {
        for (index, row) in table.rows.iter_mut().enumerate() {
            row[email] = format!("employee{:03}@company.com", index);
        }
    }

    if let Some(internal_id) = table.column_index(INTERNAL_ID_COLUMN) {
        for (index, row) in table.rows.iter_mut().enumerate() {
            row[internal_id] = format!("IBA{:05}", index);
        }
    }

    if let Some(hrbp) = table.column_index(HRBP_COLUMN) {
        pseudonymize_by_first_appearance(table, hrbp, "HRBP");
    }

    Ok(AnonymizeSummary {
        rows: table.len(),
        columns: table.headers.len(),
        managers,
    })
}

/// Read `input`, anonymize, write `output` (may be the same path)
pub fn anonymize_file(input: &Path, output: &Path, columns: &ColumnMap) -> Result<AnonymizeSummary> {
    let mut table = RawTable::from_path(input)?;
    let summary = anonymize_table(&mut table, columns)?;
    table.write_path(output)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        columns = summary.columns,
        "anonymized CSV"
    );

    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
