// 📊 Insight Report - the dashboard's numbers, computed from one Analysis
// KPIs, risk-mitigation outcome, stagnation breakdowns, hidden gems

use crate::analysis::Analysis;
use crate::config::DashboardConfig;
use crate::merger::RiskMitigation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineKpis {
    pub headcount: usize,
    pub turnover_count: usize,
    /// Fraction of prior-year headcount that left (0.0 - 1.0)
    pub turnover_rate: f64,
    /// Replacement cost of everyone who left, prior-year figures
    pub departure_cost: f64,
    pub stagnant_count: usize,
    pub high_dual_risk_count: usize,
    /// Prior-year stagnant AND high dual risk
    pub dual_risk_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// Prior-stagnant retained employees by manager change and outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagnationBreakout {
    pub changed_manager_improved: usize,
    pub changed_manager_stayed: usize,
    pub same_manager_improved: usize,
    pub same_manager_stayed: usize,
}

impl StagnationBreakout {
    /// Share of a group that broke out of stagnation (0.0 when the group is empty)
    pub fn improvement_rate(improved: usize, stayed: usize) -> f64 {
        let total = improved + stayed;
        if total == 0 {
            0.0
        } else {
            improved as f64 / total as f64
        }
    }

    pub fn changed_manager_rate(&self) -> f64 {
        Self::improvement_rate(self.changed_manager_improved, self.changed_manager_stayed)
    }

    pub fn same_manager_rate(&self) -> f64 {
        Self::improvement_rate(self.same_manager_improved, self.same_manager_stayed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTrend {
    pub department: String,
    pub prior_count: usize,
    pub current_count: usize,
}

/// High-potential, at-risk, stagnant employee with their liability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenGem {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub manager: String,
    pub potential: String,
    pub replacement_liability: f64,
    pub left: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub generated_at: DateTime<Utc>,
    pub prior_label: String,
    pub current_label: String,
    pub kpis: HeadlineKpis,
    pub risk_mitigation: RiskMitigation,
    pub risk_failure_rate: f64,
    pub manager_stagnation: Vec<GroupCount>,
    pub stagnation_breakout: StagnationBreakout,
    pub department_concentration: Vec<DepartmentTrend>,
    pub hidden_gems: Vec<HiddenGem>,
    pub hidden_gem_liability: f64,
    /// Liability of hidden gems who already left
    pub departed_dual_risk_liability: f64,
}

// ============================================================================
// COMPUTATIONS
// ============================================================================

/// Count occurrences, most frequent first, ties by name.
/// Blank values are not a group and are skipped.
pub fn value_counts<'a, I>(values: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.into_iter().filter(|v| !v.trim().is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut result: Vec<GroupCount> = counts
        .into_iter()
        .map(|(name, count)| GroupCount {
            name: name.to_string(),
            count,
        })
        .collect();

    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    result
}

pub fn headline_kpis(analysis: &Analysis) -> HeadlineKpis {
    let headcount = analysis.prior.len();
    let turnover_count = analysis.merged.left_count();

    HeadlineKpis {
        headcount,
        turnover_count,
        turnover_rate: if headcount == 0 {
            0.0
        } else {
            turnover_count as f64 / headcount as f64
        },
        departure_cost: analysis
            .merged
            .left()
            .map(|r| r.prior.replacement_cost)
            .sum(),
        stagnant_count: analysis.prior.stagnant_count(),
        high_dual_risk_count: analysis.prior.high_dual_risk_count(),
        dual_risk_candidates: analysis
            .merged
            .iter()
            .filter(|r| r.prior.is_stagnant && r.prior.is_high_dual_risk)
            .count(),
    }
}

/// Managers with the most stagnant reports in the current year
pub fn manager_stagnation(analysis: &Analysis, top_n: usize) -> Vec<GroupCount> {
    let mut counts = value_counts(analysis.current.stagnant().map(|r| r.manager.as_str()));
    counts.truncate(top_n);
    counts
}

pub fn stagnation_breakout(analysis: &Analysis) -> StagnationBreakout {
    let mut breakout = StagnationBreakout::default();

    for row in analysis.merged.iter().filter(|r| r.prior.is_stagnant) {
        let (Some(changed), Some(still_stagnant)) = (row.manager_changed(), row.still_stagnant())
        else {
            continue;
        };

        match (changed, still_stagnant) {
            (true, false) => breakout.changed_manager_improved += 1,
            (true, true) => breakout.changed_manager_stayed += 1,
            (false, false) => breakout.same_manager_improved += 1,
            (false, true) => breakout.same_manager_stayed += 1,
        }
    }

    breakout
}

/// Stagnant headcount per department in both years, for the top current-year departments
pub fn department_concentration(analysis: &Analysis, top_n: usize) -> Vec<DepartmentTrend> {
    let prior_counts = value_counts(analysis.prior.stagnant().map(|r| r.department.as_str()));
    let current_counts = value_counts(analysis.current.stagnant().map(|r| r.department.as_str()));

    current_counts
        .iter()
        .take(top_n)
        .map(|current| DepartmentTrend {
            department: current.name.clone(),
            prior_count: prior_counts
                .iter()
                .find(|p| p.name == current.name)
                .map(|p| p.count)
                .unwrap_or(0),
            current_count: current.count,
        })
        .collect()
}

pub fn hidden_gems(analysis: &Analysis, config: &DashboardConfig) -> Vec<HiddenGem> {
    let columns = &config.columns;

    analysis
        .merged
        .iter()
        .filter(|r| r.prior.is_stagnant && r.prior.is_high_dual_risk)
        .map(|r| HiddenGem {
            employee_id: r.employee_id().to_string(),
            first_name: r.prior.attribute(&columns.first_name).unwrap_or("").to_string(),
            last_name: r.prior.attribute(&columns.last_name).unwrap_or("").to_string(),
            department: r.prior.department.clone(),
            manager: r.prior.manager.clone(),
            potential: r.prior.talent_potential.clone(),
            replacement_liability: r.prior.replacement_cost,
            left: !r.is_retained(),
        })
        .collect()
}

impl InsightReport {
    pub fn build(analysis: &Analysis, config: &DashboardConfig) -> Self {
        let risk_mitigation = analysis.merged.risk_mitigation();
        let hidden_gems = hidden_gems(analysis, config);

        let hidden_gem_liability = hidden_gems.iter().map(|g| g.replacement_liability).sum();
        let departed_dual_risk_liability = hidden_gems
            .iter()
            .filter(|g| g.left)
            .map(|g| g.replacement_liability)
            .sum();

        InsightReport {
            generated_at: Utc::now(),
            prior_label: analysis.prior.label.clone(),
            current_label: analysis.current.label.clone(),
            kpis: headline_kpis(analysis),
            risk_failure_rate: risk_mitigation.failure_rate(),
            risk_mitigation,
            manager_stagnation: manager_stagnation(analysis, config.top_n),
            stagnation_breakout: stagnation_breakout(analysis),
            department_concentration: department_concentration(analysis, config.top_n),
            hidden_gems,
            hidden_gem_liability,
            departed_dual_risk_liability,
        }
    }

    /// Plain-text rendering for the CLI
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let k = &self.kpis;

        out.push_str(&format!(
            "Year-over-Year Cohort Analysis ({} vs {})\n\n",
            self.prior_label, self.current_label
        ));
        out.push_str(&format!("  Total Headcount ({}):  {}\n", self.prior_label, k.headcount));
        out.push_str(&format!(
            "  Turnover Count:          {} ({:.1}% rate)\n",
            k.turnover_count,
            k.turnover_rate * 100.0
        ));
        out.push_str(&format!("  Departure Cost:          {}\n", format_money(k.departure_cost)));
        out.push_str(&format!("  Dual Risk Candidates:    {}\n\n", k.dual_risk_candidates));

        let r = &self.risk_mitigation;
        out.push_str("1. Intervention Effectiveness\n");
        out.push_str(&format!(
            "   {} left + {} still at risk out of {} identified ({:.1}% failure rate), {} mitigated\n\n",
            r.left,
            r.still_at_risk,
            r.cohort_size(),
            self.risk_failure_rate,
            r.mitigated
        ));

        out.push_str(&format!("2. Managers with most stagnant reports ({})\n", self.current_label));
        for group in &self.manager_stagnation {
            out.push_str(&format!("   {:<30} {}\n", group.name, group.count));
        }
        out.push('\n');

        let b = &self.stagnation_breakout;
        out.push_str("3. Stagnation breakout by manager change\n");
        out.push_str(&format!(
            "   Changed manager: {} improved, {} stayed stagnant ({:.1}% improved)\n",
            b.changed_manager_improved,
            b.changed_manager_stayed,
            b.changed_manager_rate() * 100.0
        ));
        out.push_str(&format!(
            "   Same manager:    {} improved, {} stayed stagnant ({:.1}% improved)\n\n",
            b.same_manager_improved,
            b.same_manager_stayed,
            b.same_manager_rate() * 100.0
        ));

        out.push_str("4. Department concentration (stagnant headcount)\n");
        for trend in &self.department_concentration {
            out.push_str(&format!(
                "   {:<30} {} → {}\n",
                trend.department, trend.prior_count, trend.current_count
            ));
        }
        out.push('\n');

        out.push_str("5. Dual-risk hidden gems\n");
        if self.hidden_gems.is_empty() {
            out.push_str("   No employees currently fit the dual-risk criteria.\n");
        } else {
            for gem in &self.hidden_gems {
                out.push_str(&format!(
                    "   {:<10} {} {:<15} {:<20} {:<20} {:<10} {}{}\n",
                    gem.employee_id,
                    gem.first_name,
                    gem.last_name,
                    gem.department,
                    gem.manager,
                    gem.potential,
                    format_money(gem.replacement_liability),
                    if gem.left { "  (left)" } else { "" }
                ));
            }
            out.push_str(&format!(
                "   Total liability: {} ({} employees, {} already departed)\n",
                format_money(self.hidden_gem_liability),
                self.hidden_gems.len(),
                format_money(self.departed_dual_risk_liability)
            ));
        }

        out
    }
}

/// `$12,500` - whole dollars with thousands separators
pub fn format_money(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

// ============================================================================
// TESTS
// ============================================================================
