// ⚙️ Dashboard Configuration
// Column mapping, year labels and breakdown sizes, loadable from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable consulted when no `--config` flag is given
pub const CONFIG_ENV_VAR: &str = "WORKFORCE_INSIGHTS_CONFIG";

// ============================================================================
// COLUMN MAP
// ============================================================================

/// ColumnMap - logical field → CSV header
///
/// Defaults match the annual HR skill-sheet export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub employee_id: String,
    pub tenure_band: String,
    pub competence_level: String,
    pub talent_potential: String,
    pub attrition_risk: String,
    pub replacement_cost: String,
    pub department: String,
    pub manager: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            employee_id: "Team member ID".to_string(),
            tenure_band: "Time in Role (Range)".to_string(),
            competence_level: "Competence".to_string(),
            talent_potential: "Talent & Potential".to_string(),
            attrition_risk: "Attrition Risk".to_string(),
            replacement_cost: "Employee replacement".to_string(),
            department: "Department".to_string(),
            manager: "Manager".to_string(),
            first_name: "First Name".to_string(),
            last_name: "Last Name".to_string(),
        }
    }
}

impl ColumnMap {
    /// Headers that carry typed fields (everything else becomes an attribute)
    pub fn mapped_headers(&self) -> [&str; 8] {
        [
            self.employee_id.as_str(),
            self.tenure_band.as_str(),
            self.competence_level.as_str(),
            self.talent_potential.as_str(),
            self.attrition_risk.as_str(),
            self.replacement_cost.as_str(),
            self.department.as_str(),
            self.manager.as_str(),
        ]
    }
}

// ============================================================================
// DASHBOARD CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Label of the prior reporting year (e.g. "2024")
    pub prior_label: String,

    /// Label of the current reporting year (e.g. "2025")
    pub current_label: String,

    /// How many managers/departments the breakdowns keep
    pub top_n: usize,

    pub columns: ColumnMap,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            prior_label: "2024".to_string(),
            current_label: "2025".to_string(),
            top_n: 5,
            columns: ColumnMap::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Resolve the config: explicit path first, then the environment, then defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "loading dashboard config");
            return Self::from_file(path);
        }

        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                tracing::info!(path = ?path, "loading dashboard config from {}", CONFIG_ENV_VAR);
                Self::from_file(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Column suffix for prior-year fields in the merged view ("_24")
    pub fn prior_suffix(&self) -> String {
        year_suffix(&self.prior_label)
    }

    /// Column suffix for current-year fields in the merged view ("_25")
    pub fn current_suffix(&self) -> String {
        year_suffix(&self.current_label)
    }
}

fn year_suffix(label: &str) -> String {
    let chars: Vec<char> = label.trim().chars().collect();
    let start = chars.len().saturating_sub(2);
    let tail: String = chars[start..].iter().collect();
    format!("_{}", tail)
}

// ============================================================================
// TESTS
// ============================================================================
