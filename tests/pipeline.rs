// End-to-end: CSV exports on disk → analysis → report / merged export / anonymized copy

use std::fs;
use workforce_insights::{
    anonymize_file, Analysis, CohortError, DashboardConfig, InsightReport, RawTable,
    RetentionStatus,
};

const PRIOR: &str = "\
Team member ID,First Name,Last Name,email,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager,Employee replacement
7,Ann,Lee,ann@corp.com,5+ years,Starter 1,HIGHPO,HIGH,Ops,Smith,\"$12,500.00\"
8,Bo,Kim,bo@corp.com,5+ years,Director,KEY,LOW,Ops,Smith,\"40,000\"
9,Cy,Ng,cy@corp.com,3-4,confirm1,rising,very high,R&D,Jones,N/A
9,Cy,Ng,cy@corp.com,3-4,confirm1,rising,very high,R&D,Jones,N/A
10,Di,Ho,di@corp.com,1-2,STARTER1,STAR,MEDIUM,R&D,Jones,3000
";

const CURRENT: &str = "\
Team member ID,First Name,Last Name,email,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager,Employee replacement
8,Bo,Kim,bo@corp.com,5+ years,Director,KEY,LOW,Ops,Smith,\"40,000\"
9,Cy,Ng,cy@corp.com,>4,EXPERC1,rising,low,R&D,Patel,1000
10,Di,Ho,di@corp.com,3-5 years,STARTER2,STAR,HIGH,R&D,Jones,3000
11,Ed,Wu,ed@corp.com,>4,STARTER1,KEY,HIGH,Sales,Brown,500
";

fn write_exports() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let prior = dir.path().join("2024.csv");
    let current = dir.path().join("2025.csv");
    fs::write(&prior, PRIOR).unwrap();
    fs::write(&current, CURRENT).unwrap();
    (dir, prior, current)
}

#[test]
fn test_full_pipeline_report() {
    let (_dir, prior, current) = write_exports();
    let config = DashboardConfig::default();

    let analysis = Analysis::from_paths(&prior, &current, &config).unwrap();

    // One row per prior-year row, duplicates included; new hire 11 absent
    assert_eq!(analysis.merged.len(), analysis.prior.len());
    assert_eq!(analysis.merged.len(), 5);
    assert!(analysis.merged.iter().all(|r| r.employee_id() != "11"));

    let status: Vec<(&str, RetentionStatus)> = analysis
        .merged
        .iter()
        .map(|r| (r.employee_id(), r.status))
        .collect();
    assert_eq!(
        status,
        vec![
            ("7", RetentionStatus::Left),
            ("8", RetentionStatus::Retained),
            ("9", RetentionStatus::Retained),
            ("9", RetentionStatus::Retained),
            ("10", RetentionStatus::Retained),
        ]
    );

    let report = InsightReport::build(&analysis, &config);

    assert_eq!(report.kpis.headcount, 5);
    assert_eq!(report.kpis.turnover_count, 1);
    assert_eq!(report.kpis.turnover_rate, 0.2);
    assert_eq!(report.kpis.departure_cost, 12500.0);

    // 7 and both 9s are stagnant + dual risk in the prior year
    assert_eq!(report.kpis.dual_risk_candidates, 3);
    assert_eq!(report.hidden_gems.len(), 3);
    assert_eq!(report.hidden_gem_liability, 12500.0);
    assert_eq!(report.departed_dual_risk_liability, 12500.0);

    // Dual-risk cohort: 7 left, 9 ×2 mitigated, 10 still at risk
    assert_eq!(report.risk_mitigation.left, 1);
    assert_eq!(report.risk_mitigation.mitigated, 2);
    assert_eq!(report.risk_mitigation.still_at_risk, 1);

    // Both 9s changed manager and are still stagnant (EXPERC1 at >4)
    assert_eq!(report.stagnation_breakout.changed_manager_stayed, 2);

    assert_eq!(report.manager_stagnation[0].name, "Brown");
    assert_eq!(report.manager_stagnation.len(), 3);
}

#[test]
fn test_merged_export_round_trips_through_csv() {
    let (dir, prior, current) = write_exports();
    let config = DashboardConfig::default();
    let analysis = Analysis::from_paths(&prior, &current, &config).unwrap();

    let out = dir.path().join("merged.csv");
    analysis.merged_table(&config).write_path(&out).unwrap();

    let merged = RawTable::from_path(&out).unwrap();
    assert_eq!(merged.len(), 5);

    let cost = merged.column_index("Employee replacement_24").unwrap();
    let manager = merged.column_index("Manager_25").unwrap();
    let status = merged.column_index("status").unwrap();

    assert_eq!(merged.cell(0, cost), "12500");
    assert_eq!(merged.cell(0, manager), "");
    assert_eq!(merged.cell(0, status), "Left");
    assert_eq!(merged.cell(2, manager), "Patel");
}

#[test]
fn test_duplicate_current_ids_abort_the_pipeline() {
    let (dir, prior, _) = write_exports();
    let current = dir.path().join("2025_dupes.csv");
    fs::write(&current, format!("{}8,Bo,Kim,x,1-2,LEAD,KEY,LOW,Ops,Smith,1\n", CURRENT)).unwrap();

    let err = Analysis::from_paths(&prior, &current, &DashboardConfig::default()).unwrap_err();
    let cohort = err.downcast_ref::<CohortError>().unwrap();
    assert!(matches!(cohort, CohortError::DuplicateEmployeeId { id, .. } if id == "8"));
}

#[test]
fn test_anonymized_export_still_analyzes() {
    let (_dir, prior, current) = write_exports();
    let config = DashboardConfig::default();

    anonymize_file(&prior, &prior, &config.columns).unwrap();
    anonymize_file(&current, &current, &config.columns).unwrap();

    let scrubbed = fs::read_to_string(&prior).unwrap();
    assert!(!scrubbed.contains("Smith"));
    assert!(!scrubbed.contains("ann@corp.com"));

    let analysis = Analysis::from_paths(&prior, &current, &config).unwrap();
    assert_eq!(analysis.merged.left_count(), 1);
    assert_eq!(analysis.prior.records[0].manager, "Manager A");
}
