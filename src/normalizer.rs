// 🏷️ Cohort Normalizer - free-text HR fields → boolean cohort flags
// Fixed marker tables, membership tests, and lossy currency cleanup

use crate::config::ColumnMap;
use crate::error::{CohortError, CohortResult};
use crate::snapshot::{CohortSnapshot, EmployeeRecord, RawTable, SnapshotRole, DERIVED_COLUMNS};

// ============================================================================
// MARKER TABLES
// ============================================================================

/// Time-in-role bands that count as long tenure.
/// Compared after trimming only, never uppercased.
pub const LONG_TENURE_MARKERS: [&str; 4] = [">4", "3-4", "3-5 years", "5+ years"];

/// Entry/early competence tiers. The field is uppercased before comparison,
/// so the mixed-case entries match their uppercase form.
pub const EARLY_COMPETENCE_MARKERS: [&str; 14] = [
    "STARTER1", "STARTER2", "STARTER3",
    "CONFIRM1", "CONFIRM2", "CONFIRM3",
    "EXPERC1", "EXPERC2", "SPECIALIST",
    "Starter 1", "Starter 2", "Confirmed 1", "Confirmed 2", "Experienced 1",
];

pub const HIGH_POTENTIAL_MARKERS: [&str; 5] = ["KEY", "HIGHPO", "RISING", "CONSIST", "STAR"];

pub const ELEVATED_RISK_MARKERS: [&str; 3] = ["MEDIUM", "HIGH", "VERY HIGH"];

/// Symbols stripped from money cells before parsing
const MONEY_NOISE: [char; 5] = [',', '"', '$', '€', '£'];

// ============================================================================
// FIELD PREDICATES
// ============================================================================

fn upper_trim(raw: &str) -> String {
    raw.to_uppercase().trim().to_string()
}

pub fn is_long_tenure(tenure_band: &str) -> bool {
    LONG_TENURE_MARKERS.contains(&tenure_band.trim())
}

pub fn is_early_competence(competence_level: &str) -> bool {
    let normalized = upper_trim(competence_level);
    EARLY_COMPETENCE_MARKERS
        .iter()
        .any(|marker| marker.to_uppercase() == normalized)
}

pub fn is_high_potential(talent_potential: &str) -> bool {
    HIGH_POTENTIAL_MARKERS.contains(&upper_trim(talent_potential).as_str())
}

pub fn is_elevated_risk(attrition_risk: &str) -> bool {
    ELEVATED_RISK_MARKERS.contains(&upper_trim(attrition_risk).as_str())
}

/// Long tenure AND early competence
pub fn is_stagnant(tenure_band: &str, competence_level: &str) -> bool {
    is_long_tenure(tenure_band) && is_early_competence(competence_level)
}

/// High potential AND elevated attrition risk
pub fn is_high_dual_risk(talent_potential: &str, attrition_risk: &str) -> bool {
    is_high_potential(talent_potential) && is_elevated_risk(attrition_risk)
}

/// Clean a money cell: `"$12,500.00"` → 12500.0.
///
/// Missing, empty, unparseable or non-finite input yields 0.0.
pub fn parse_money(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };

    let cleaned: String = raw.chars().filter(|c| !MONEY_NOISE.contains(c)).collect();

    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// Column positions resolved once per table
struct ResolvedColumns {
    employee_id: usize,
    tenure_band: usize,
    competence_level: usize,
    talent_potential: usize,
    attrition_risk: usize,
    replacement_cost: Option<usize>,
    department: Option<usize>,
    manager: Option<usize>,
    attributes: Vec<usize>,
}

pub struct Normalizer {
    columns: ColumnMap,
}

impl Normalizer {
    pub fn new(columns: ColumnMap) -> Self {
        Normalizer { columns }
    }

    /// Recompute the derived flags of one record from its source text
    pub fn classify(record: &mut EmployeeRecord) {
        record.is_stagnant = is_stagnant(&record.tenure_band, &record.competence_level);
        record.is_high_dual_risk =
            is_high_dual_risk(&record.talent_potential, &record.attrition_risk);
    }

    fn resolve(
        &self,
        table: &RawTable,
        label: &str,
        role: SnapshotRole,
    ) -> CohortResult<ResolvedColumns> {
        let required = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| CohortError::MissingColumn {
                    column: column.to_string(),
                    snapshot: format!("{} ({})", role, label),
                })
        };

        let employee_id = required(&self.columns.employee_id)?;
        let tenure_band = required(&self.columns.tenure_band)?;
        let competence_level = required(&self.columns.competence_level)?;
        let talent_potential = required(&self.columns.talent_potential)?;
        let attrition_risk = required(&self.columns.attrition_risk)?;

        let mapped = self.columns.mapped_headers();
        let attributes = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !mapped.contains(&h.as_str()) && !DERIVED_COLUMNS.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();

        Ok(ResolvedColumns {
            employee_id,
            tenure_band,
            competence_level,
            talent_potential,
            attrition_risk,
            replacement_cost: table.column_index(&self.columns.replacement_cost),
            department: table.column_index(&self.columns.department),
            manager: table.column_index(&self.columns.manager),
            attributes,
        })
    }

    /// Normalize one raw table into a snapshot
    pub fn normalize(
        &self,
        table: &RawTable,
        label: &str,
        role: SnapshotRole,
    ) -> CohortResult<CohortSnapshot> {
        let cols = self.resolve(table, label, role)?;

        if cols.replacement_cost.is_none() {
            tracing::info!(
                snapshot = %role,
                column = %self.columns.replacement_cost,
                "replacement cost column absent; defaulting every record to 0.0"
            );
        }

        let optional = |row: usize, column: Option<usize>| -> String {
            column.map(|c| table.cell(row, c).to_string()).unwrap_or_default()
        };

        let mut cost_fallbacks = 0usize;
        let mut records = Vec::with_capacity(table.len());

        for row in 0..table.len() {
            let raw_cost = cols.replacement_cost.map(|c| table.cell(row, c));
            let replacement_cost = parse_money(raw_cost);
            if replacement_cost == 0.0 && raw_cost.is_some_and(|c| !c.trim().is_empty()) {
                cost_fallbacks += 1;
            }

            let mut record = EmployeeRecord {
                employee_id: table.cell(row, cols.employee_id).trim().to_string(),
                tenure_band: table.cell(row, cols.tenure_band).to_string(),
                competence_level: table.cell(row, cols.competence_level).to_string(),
                talent_potential: table.cell(row, cols.talent_potential).to_string(),
                attrition_risk: table.cell(row, cols.attrition_risk).to_string(),
                department: optional(row, cols.department),
                manager: optional(row, cols.manager),
                replacement_cost,
                is_stagnant: false,
                is_high_dual_risk: false,
                attributes: cols
                    .attributes
                    .iter()
                    .map(|&c| (table.headers[c].clone(), table.cell(row, c).to_string()))
                    .collect(),
            };

            Self::classify(&mut record);
            records.push(record);
        }

        let snapshot = CohortSnapshot {
            label: label.to_string(),
            role,
            records,
            attribute_headers: cols
                .attributes
                .iter()
                .map(|&c| table.headers[c].clone())
                .collect(),
        };

        tracing::info!(
            snapshot = %snapshot.describe(),
            records = snapshot.len(),
            stagnant = snapshot.stagnant_count(),
            high_dual_risk = snapshot.high_dual_risk_count(),
            cost_fallbacks,
            "normalized snapshot"
        );

        Ok(snapshot)
    }

    /// Recompute flags on an already-normalized snapshot.
    /// Costs are numeric already and stay untouched.
    pub fn renormalize(&self, snapshot: &CohortSnapshot) -> CohortSnapshot {
        let mut next = snapshot.clone();
        for record in &mut next.records {
            Self::classify(record);
        }
        next
    }
}

// ============================================================================
// TESTS
// ============================================================================
