//! Analysis result and derived indexes
//!
//! [`AnalysisResult`] is built once per analysis and never mutated by
//! reporters. The ordered finding list is authoritative; the per-component
//! indexes are convenience views derived from it.

use chrono::{DateTime, Utc};
use precheck_model::{CheckResult, ComponentType, ParamKind, RiskLevel, Severity, Value};
use precheck_rules::consistency::CONSISTENCY_CATEGORY;
use precheck_rules::upgrade_differences::UPGRADE_DIFFERENCE_CATEGORY;
use precheck_rules::user_modified::USER_MODIFIED_CATEGORY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of findings recording a failed rule
pub const RULE_ERROR_CATEGORY: &str = "rule_error";

/// Metadata flag set on rule failure findings
pub const META_RULE_FAILED: &str = "rule_failed";

/// Index keyed by component kind, then flat-namespace parameter key
pub type ParameterIndex<T> = BTreeMap<ComponentType, BTreeMap<String, T>>;

/// One parameter in a derived index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Config parameter or system variable
    pub param_type: ParamKind,
    /// Observed value
    pub current_value: Option<Value>,
    /// Default at the source release
    pub source_default: Option<Value>,
    /// Default at the target release
    pub target_default: Option<Value>,
    /// Value the upgrade will force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_value: Option<Value>,
    /// Severity of the originating finding
    pub severity: Severity,
    /// Risk of the originating finding
    pub risk_level: RiskLevel,
    /// Message of the originating finding
    pub message: String,
}

impl From<&CheckResult> for ParameterEntry {
    fn from(finding: &CheckResult) -> Self {
        Self {
            param_type: finding.param_type,
            current_value: finding.current_value.clone(),
            source_default: finding.source_default.clone(),
            target_default: finding.target_default.clone(),
            forced_value: finding.forced_value.clone(),
            severity: finding.severity,
            risk_level: finding.risk_level,
            message: finding.message.clone(),
        }
    }
}

/// Value of a parameter on one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InconsistentNode {
    /// Instance name
    pub instance: String,
    /// Node address, or the instance name when unknown
    pub node_address: String,
    /// Observed value, absent when the node lacks the parameter
    pub value: Option<Value>,
}

/// Always-reported parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusParam {
    /// Config parameter or system variable
    pub param_type: ParamKind,
    /// Observed value
    pub current_value: Option<Value>,
    /// Default at the source release
    pub source_default: Option<Value>,
    /// Default at the target release
    pub target_default: Option<Value>,
    /// Current value differs from the source default
    pub is_modified: bool,
    /// The upgrade will change the effective value
    pub will_change: bool,
}

/// Finding counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// All findings
    pub total: usize,
    /// Informational findings
    pub info: usize,
    /// Warnings
    pub warning: usize,
    /// Errors
    pub error: usize,
    /// Low-risk findings
    pub low_risk: usize,
    /// Medium-risk findings
    pub medium_risk: usize,
    /// High-risk findings
    pub high_risk: usize,
    /// Parameters removed before rule evaluation
    pub filtered: usize,
    /// Rules that failed
    pub rule_errors: usize,
}

/// Output of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Version the cluster runs
    pub source_version: String,
    /// Version being upgraded to
    pub target_version: String,
    /// Time the analysis ran, only set by [`crate::Analyzer::analyze_at`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Findings, preprocessor first, then in rule registration order
    pub check_results: Vec<CheckResult>,
    /// Parameters the user changed from the source default
    pub modified_params: ParameterIndex<ParameterEntry>,
    /// Default drifts and new or removed parameters
    pub upgrade_differences: ParameterIndex<ParameterEntry>,
    /// Values the upgrade will force
    pub forced_changes: ParameterIndex<ParameterEntry>,
    /// Per-node values of parameters that differ across nodes
    pub inconsistencies: ParameterIndex<Vec<InconsistentNode>>,
    /// Always-reported parameters
    #[serde(default)]
    pub focus_params: ParameterIndex<FocusParam>,
}

impl AnalysisResult {
    /// Build result and derive indexes from ordered findings
    #[must_use]
    pub fn from_findings(
        source_version: impl Into<String>,
        target_version: impl Into<String>,
        check_results: Vec<CheckResult>,
    ) -> Self {
        let mut result = Self {
            source_version: source_version.into(),
            target_version: target_version.into(),
            generated_at: None,
            check_results: Vec::new(),
            modified_params: BTreeMap::new(),
            upgrade_differences: BTreeMap::new(),
            forced_changes: BTreeMap::new(),
            inconsistencies: BTreeMap::new(),
            focus_params: BTreeMap::new(),
        };
        for finding in &check_results {
            result.index(finding);
        }
        result.check_results = check_results;
        result
    }

    fn index(&mut self, finding: &CheckResult) {
        let Some(component) = finding.component else {
            return;
        };
        let key = finding.flat_key();
        let flag = |name: &str| {
            finding
                .metadata
                .get(name)
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false)
        };

        let category = finding.category.as_str();
        if category == USER_MODIFIED_CATEGORY && !flag("undetermined") {
            self.modified_params
                .entry(component)
                .or_default()
                .insert(key, finding.into());
        } else if category == UPGRADE_DIFFERENCE_CATEGORY && flag("forced") {
            keep_riskiest(&mut self.forced_changes, component, key, finding);
        } else if category == UPGRADE_DIFFERENCE_CATEGORY && !flag("undetermined") {
            keep_riskiest(&mut self.upgrade_differences, component, key, finding);
        } else if category == CONSISTENCY_CATEGORY {
            self.inconsistencies
                .entry(component)
                .or_default()
                .insert(key, nodes(finding));
        }
    }

    /// Attach focus-parameter index
    #[must_use]
    pub fn with_focus_params(mut self, focus_params: ParameterIndex<FocusParam>) -> Self {
        self.focus_params = focus_params;
        self
    }

    /// Stamp the analysis time
    #[must_use]
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Findings of one category, in order
    pub fn findings_in<'s>(&'s self, category: &'s str) -> impl Iterator<Item = &'s CheckResult> {
        self.check_results
            .iter()
            .filter(move |finding| finding.category == category)
    }

    /// Findings produced by rules, excluding filtered parameters
    pub fn actionable(&self) -> impl Iterator<Item = &CheckResult> {
        self.check_results.iter().filter(|finding| !finding.is_filtered())
    }

    /// Highest risk among all findings
    #[must_use]
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.check_results.iter().map(|finding| finding.risk_level).max()
    }

    /// Count findings by severity, risk and kind
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.check_results.len(),
            ..Summary::default()
        };
        for finding in &self.check_results {
            match finding.severity {
                Severity::Info => summary.info += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Error => summary.error += 1,
            }
            match finding.risk_level {
                RiskLevel::Low => summary.low_risk += 1,
                RiskLevel::Medium => summary.medium_risk += 1,
                RiskLevel::High => summary.high_risk += 1,
            }
            if finding.is_filtered() {
                summary.filtered += 1;
            }
            if finding.category == RULE_ERROR_CATEGORY {
                summary.rule_errors += 1;
            }
        }
        summary
    }

    /// Serialize as pretty-printed JSON
    ///
    /// # Errors
    /// Returns the encoder error; unreachable for well-formed results.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Keep the first entry of the highest risk per parameter
fn keep_riskiest(
    index: &mut ParameterIndex<ParameterEntry>,
    component: ComponentType,
    key: String,
    finding: &CheckResult,
) {
    let entries = index.entry(component).or_default();
    match entries.get(&key) {
        Some(kept) if kept.risk_level >= finding.risk_level => {}
        _ => {
            entries.insert(key, finding.into());
        }
    }
}

fn nodes(finding: &CheckResult) -> Vec<InconsistentNode> {
    let Some(instances) = finding
        .metadata
        .get("instances")
        .and_then(serde_json::Value::as_array)
    else {
        return Vec::new();
    };
    instances
        .iter()
        .filter_map(|entry| {
            let instance = entry.get("instance")?.as_str()?.to_string();
            let node_address = entry
                .get("address")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| instance.clone(), str::to_string);
            let value = entry.get("value").cloned().and_then(Value::from_json);
            Some(InconsistentNode {
                instance,
                node_address,
                value,
            })
        })
        .collect()
}
