// 🔗 Cohort Merger - year-over-year left join on employee id
// Prior-year population drives the view; current-year rows are lookup targets

use crate::config::ColumnMap;
use crate::error::{CohortError, CohortResult};
use crate::snapshot::{record_cells, table_headers, CohortSnapshot, EmployeeRecord, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetentionStatus {
    Retained,
    Left,
}

impl fmt::Display for RetentionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionStatus::Retained => write!(f, "Retained"),
            RetentionStatus::Left => write!(f, "Left"),
        }
    }
}

// ============================================================================
// MERGED ROW
// ============================================================================

/// One prior-year employee and, if still present, their current-year record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub prior: EmployeeRecord,
    pub current: Option<EmployeeRecord>,
    pub status: RetentionStatus,
}

impl MergedRow {
    pub fn employee_id(&self) -> &str {
        &self.prior.employee_id
    }

    pub fn is_retained(&self) -> bool {
        self.status == RetentionStatus::Retained
    }

    /// Manager differs between years. None for employees who left.
    pub fn manager_changed(&self) -> Option<bool> {
        self.current
            .as_ref()
            .map(|current| current.manager != self.prior.manager)
    }

    /// Still high-potential + elevated-risk in the current year. None when left.
    pub fn still_high_dual_risk(&self) -> Option<bool> {
        self.current.as_ref().map(|current| current.is_high_dual_risk)
    }

    /// Still stagnant in the current year. None when left.
    pub fn still_stagnant(&self) -> Option<bool> {
        self.current.as_ref().map(|current| current.is_stagnant)
    }
}

// ============================================================================
// RISK MITIGATION OUTCOME
// ============================================================================

/// Prior-year dual-risk cohort split by what happened to them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMitigation {
    pub left: usize,
    pub still_at_risk: usize,
    pub mitigated: usize,
}

impl RiskMitigation {
    pub fn cohort_size(&self) -> usize {
        self.left + self.still_at_risk + self.mitigated
    }

    /// Percentage of the cohort that left or is still at risk (0.0 for an empty cohort)
    pub fn failure_rate(&self) -> f64 {
        let size = self.cohort_size();
        if size == 0 {
            return 0.0;
        }
        (self.left + self.still_at_risk) as f64 / size as f64 * 100.0
    }
}

// ============================================================================
// MERGED VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedView {
    pub prior_label: String,
    pub current_label: String,
    pub rows: Vec<MergedRow>,

    // Attribute headers of each side, for flattening
    pub prior_attribute_headers: Vec<String>,
    pub current_attribute_headers: Vec<String>,
}

impl MergedView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedRow> {
        self.rows.iter()
    }

    pub fn left(&self) -> impl Iterator<Item = &MergedRow> {
        self.rows.iter().filter(|r| r.status == RetentionStatus::Left)
    }

    pub fn left_count(&self) -> usize {
        self.left().count()
    }

    pub fn retained_count(&self) -> usize {
        self.len() - self.left_count()
    }

    pub fn risk_mitigation(&self) -> RiskMitigation {
        let mut outcome = RiskMitigation::default();

        for row in self.rows.iter().filter(|r| r.prior.is_high_dual_risk) {
            match row.still_high_dual_risk() {
                None => outcome.left += 1,
                Some(true) => outcome.still_at_risk += 1,
                Some(false) => outcome.mitigated += 1,
            }
        }

        outcome
    }

    /// Flatten to one table.
    ///
    /// The id column appears once; every other column present in both years is
    /// suffixed (`Manager_24`, `Manager_25`); a trailing `status` column holds
    /// Retained/Left. Unmatched current-year cells are empty.
    pub fn to_raw_table(
        &self,
        columns: &ColumnMap,
        prior_suffix: &str,
        current_suffix: &str,
    ) -> RawTable {
        let prior_headers = table_headers(columns, &self.prior_attribute_headers);
        let current_headers = table_headers(columns, &self.current_attribute_headers);

        let disambiguate = |header: &String, other: &[String], suffix: &str| {
            if other.contains(header) {
                format!("{}{}", header, suffix)
            } else {
                header.clone()
            }
        };

        // Index 0 is the id column on both sides
        let mut headers = vec![columns.employee_id.clone()];
        headers.extend(
            prior_headers[1..]
                .iter()
                .map(|h| disambiguate(h, &current_headers, prior_suffix)),
        );
        headers.extend(
            current_headers[1..]
                .iter()
                .map(|h| disambiguate(h, &prior_headers, current_suffix)),
        );
        headers.push("status".to_string());

        let mut table = RawTable::new(headers);

        for row in &self.rows {
            let mut cells = vec![row.employee_id().to_string()];
            cells.extend(
                record_cells(&row.prior, &self.prior_attribute_headers)
                    .into_iter()
                    .skip(1),
            );
            match &row.current {
                Some(current) => cells.extend(
                    record_cells(current, &self.current_attribute_headers)
                        .into_iter()
                        .skip(1),
                ),
                None => cells.extend(std::iter::repeat(String::new()).take(current_headers.len() - 1)),
            }
            cells.push(row.status.to_string());
            table.rows.push(cells);
        }

        table
    }
}

// ============================================================================
// MERGER
// ============================================================================

pub struct CohortMerger;

impl CohortMerger {
    /// Left outer join of `prior` onto `current` by employee id.
    ///
    /// Duplicate ids in `prior` each produce a row; duplicate ids in `current`
    /// are rejected since the join target would be ambiguous.
    pub fn merge(prior: &CohortSnapshot, current: &CohortSnapshot) -> CohortResult<MergedView> {
        let mut targets: HashMap<&str, &EmployeeRecord> = HashMap::with_capacity(current.len());

        for record in &current.records {
            if targets.insert(record.employee_id.as_str(), record).is_some() {
                return Err(CohortError::DuplicateEmployeeId {
                    id: record.employee_id.clone(),
                    snapshot: current.describe(),
                });
            }
        }

        let rows: Vec<MergedRow> = prior
            .records
            .iter()
            .map(|record| {
                let matched = targets.get(record.employee_id.as_str()).map(|r| (*r).clone());
                let status = if matched.is_some() {
                    RetentionStatus::Retained
                } else {
                    RetentionStatus::Left
                };

                MergedRow {
                    prior: record.clone(),
                    current: matched,
                    status,
                }
            })
            .collect();

        let view = MergedView {
            prior_label: prior.label.clone(),
            current_label: current.label.clone(),
            rows,
            prior_attribute_headers: prior.attribute_headers.clone(),
            current_attribute_headers: current.attribute_headers.clone(),
        };

        tracing::info!(
            prior = %prior.describe(),
            current = %current.describe(),
            rows = view.len(),
            retained = view.retained_count(),
            left = view.left_count(),
            "merged snapshots"
        );

        Ok(view)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRole;

    fn record(id: &str, manager: &str, stagnant: bool, dual_risk: bool) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            tenure_band: "5+ years".to_string(),
            competence_level: "Starter 1".to_string(),
            talent_potential: "KEY".to_string(),
            attrition_risk: "HIGH".to_string(),
            department: "Ops".to_string(),
            manager: manager.to_string(),
            replacement_cost: 1000.0,
            is_stagnant: stagnant,
            is_high_dual_risk: dual_risk,
            attributes: vec![("First Name".to_string(), format!("Name {}", id))],
        }
    }

    fn snapshot(label: &str, role: SnapshotRole, records: Vec<EmployeeRecord>) -> CohortSnapshot {
        CohortSnapshot {
            label: label.to_string(),
            role,
            records,
            attribute_headers: vec!["First Name".to_string()],
        }
    }

    #[test]
    fn test_departed_employee_is_left() {
        let prior = snapshot(
            "2024",
            SnapshotRole::Prior,
            vec![record("7", "Alice", false, false), record("8", "Alice", false, false)],
        );
        let current = snapshot("2025", SnapshotRole::Current, vec![record("8", "Alice", false, false)]);

        let view = CohortMerger::merge(&prior, &current).unwrap();

        assert_eq!(view.len(), prior.len());
        assert_eq!(view.rows[0].employee_id(), "7");
        assert_eq!(view.rows[0].status, RetentionStatus::Left);
        assert!(view.rows[0].current.is_none());
        assert_eq!(view.rows[1].status, RetentionStatus::Retained);
        assert_eq!(view.left_count(), 1);
        assert_eq!(view.retained_count(), 1);
    }

    #[test]
    fn test_ids_are_trimmed_but_case_sensitive() {
        use crate::config::ColumnMap;
        use crate::normalizer::Normalizer;
        use std::io::Cursor;

        let header = "Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk\n";
        let table = |rows: &str| RawTable::from_reader(Cursor::new(format!("{}{}", header, rows))).unwrap();

        let normalizer = Normalizer::new(ColumnMap::default());
        let prior = normalizer
            .normalize(&table(" 7 ,1-2,LEAD,SOLID,LOW\na1,1-2,LEAD,SOLID,LOW\n"), "2024", SnapshotRole::Prior)
            .unwrap();
        let current = normalizer
            .normalize(&table("7,1-2,LEAD,SOLID,LOW\nA1,1-2,LEAD,SOLID,LOW\n"), "2025", SnapshotRole::Current)
            .unwrap();

        let view = CohortMerger::merge(&prior, &current).unwrap();

        assert_eq!(view.rows[0].employee_id(), "7");
        assert_eq!(view.rows[0].status, RetentionStatus::Retained);
        assert_eq!(view.rows[1].employee_id(), "a1");
        assert_eq!(view.rows[1].status, RetentionStatus::Left);
    }

    #[test]
    fn test_current_only_employees_are_absent() {
        let prior = snapshot("2024", SnapshotRole::Prior, vec![record("1", "A", false, false)]);
        let current = snapshot(
            "2025",
            SnapshotRole::Current,
            vec![record("1", "A", false, false), record("99", "A", false, false)],
        );

        let view = CohortMerger::merge(&prior, &current).unwrap();
        assert_eq!(view.len(), 1);
        assert!(view.iter().all(|r| r.employee_id() != "99"));
    }

    #[test]
    fn test_prior_duplicates_each_get_a_row() {
        let prior = snapshot(
            "2024",
            SnapshotRole::Prior,
            vec![record("9", "A", false, false), record("9", "B", false, false)],
        );
        let current = snapshot("2025", SnapshotRole::Current, vec![record("9", "C", false, false)]);

        let view = CohortMerger::merge(&prior, &current).unwrap();

        assert_eq!(view.len(), 2);
        for row in view.iter() {
            assert_eq!(row.status, RetentionStatus::Retained);
            assert_eq!(row.current.as_ref().unwrap().manager, "C");
        }
    }

    #[test]
    fn test_current_duplicates_are_fatal() {
        let prior = snapshot("2024", SnapshotRole::Prior, vec![record("9", "A", false, false)]);
        let current = snapshot(
            "2025",
            SnapshotRole::Current,
            vec![record("9", "A", false, false), record("9", "B", false, false)],
        );

        let err = CohortMerger::merge(&prior, &current).unwrap_err();
        match err {
            CohortError::DuplicateEmployeeId { id, snapshot } => {
                assert_eq!(id, "9");
                assert_eq!(snapshot, "current-year (2025)");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_manager_change_only_for_retained() {
        let prior = snapshot(
            "2024",
            SnapshotRole::Prior,
            vec![
                record("1", "Alice", true, false),
                record("2", "Alice", true, false),
                record("3", "Alice", true, false),
            ],
        );
        let current = snapshot(
            "2025",
            SnapshotRole::Current,
            vec![record("1", "Bob", false, false), record("2", "Alice", true, false)],
        );

        let view = CohortMerger::merge(&prior, &current).unwrap();
        assert_eq!(view.rows[0].manager_changed(), Some(true));
        assert_eq!(view.rows[1].manager_changed(), Some(false));
        assert_eq!(view.rows[2].manager_changed(), None);
        assert_eq!(view.rows[0].still_stagnant(), Some(false));
    }

    #[test]
    fn test_risk_mitigation_partition() {
        let prior = snapshot(
            "2024",
            SnapshotRole::Prior,
            vec![
                record("1", "A", false, true),
                record("2", "A", false, true),
                record("3", "A", false, true),
                record("4", "A", false, false),
            ],
        );
        let current = snapshot(
            "2025",
            SnapshotRole::Current,
            vec![record("2", "A", false, true), record("3", "A", false, false)],
        );

        let outcome = CohortMerger::merge(&prior, &current).unwrap().risk_mitigation();

        assert_eq!(outcome.left, 1);
        assert_eq!(outcome.still_at_risk, 1);
        assert_eq!(outcome.mitigated, 1);
        assert_eq!(outcome.cohort_size(), 3);
        assert!((outcome.failure_rate() - 66.666).abs() < 0.01);
        assert_eq!(RiskMitigation::default().failure_rate(), 0.0);
    }

    #[test]
    fn test_flattened_table_uses_year_suffixes() {
        let prior = snapshot(
            "2024",
            SnapshotRole::Prior,
            vec![record("1", "Alice", true, false), record("2", "Alice", false, false)],
        );
        let current = snapshot("2025", SnapshotRole::Current, vec![record("1", "Bob", false, false)]);
        let columns = ColumnMap::default();

        let view = CohortMerger::merge(&prior, &current).unwrap();
        let table = view.to_raw_table(&columns, "_24", "_25");

        assert_eq!(table.headers[0], "Team member ID");
        assert_eq!(table.headers.last().map(String::as_str), Some("status"));
        assert_eq!(table.len(), 2);

        let m24 = table.column_index("Manager_24").unwrap();
        let m25 = table.column_index("Manager_25").unwrap();
        let stagnant24 = table.column_index("is_stagnant_24").unwrap();
        let status = table.column_index("status").unwrap();

        assert_eq!(table.cell(0, m24), "Alice");
        assert_eq!(table.cell(0, m25), "Bob");
        assert_eq!(table.cell(0, stagnant24), "true");
        assert_eq!(table.cell(0, status), "Retained");
        assert_eq!(table.cell(1, m25), "");
        assert_eq!(table.cell(1, status), "Left");
        assert!(table.rows.iter().all(|r| r.len() == table.headers.len()));
    }
}
