//! Findings produced by an analysis
//!
//! A [`CheckResult`] is one classified observation about a single parameter
//! on a single component. Findings are built once and never mutated after
//! they leave the producing rule.

use crate::component::{split_key, ComponentType, ParamKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key marking a finding emitted for a parameter removed before rules run
pub const META_FILTERED: &str = "filtered";

/// How urgently a finding needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    #[default]
    Info,
    /// Review recommended
    Warning,
    /// Action required
    Error,
}

impl Severity {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Risk level conventionally paired with this severity
    #[must_use]
    pub fn default_risk(self) -> RiskLevel {
        match self {
            Self::Info => RiskLevel::Low,
            Self::Warning => RiskLevel::Medium,
            Self::Error => RiskLevel::High,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upgrade risk attached to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing will break
    #[default]
    Low,
    /// Behaviour may change
    Medium,
    /// Value will change regardless of intent
    High,
}

impl RiskLevel {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Producing rule
    pub rule_id: String,
    /// Finding category (`filtered`, `upgrade_difference`, ...)
    pub category: String,
    /// Component kind concerned, absent for rule failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentType>,
    /// Display name (without `sysvar:` prefix)
    #[serde(default)]
    pub parameter_name: String,
    /// Config parameter or system variable
    #[serde(default = "default_kind")]
    pub param_type: ParamKind,
    /// Severity
    pub severity: Severity,
    /// Risk level
    pub risk_level: RiskLevel,
    /// One-line summary
    pub message: String,
    /// Longer explanation
    #[serde(default)]
    pub details: String,
    /// Observed value
    #[serde(default)]
    pub current_value: Option<Value>,
    /// Default at the source release
    #[serde(default)]
    pub source_default: Option<Value>,
    /// Default at the target release
    #[serde(default)]
    pub target_default: Option<Value>,
    /// Value the upgrade will force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_value: Option<Value>,
    /// Ordered remediation hints
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Free-form annotations
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_kind() -> ParamKind {
    ParamKind::Config
}

impl CheckResult {
    /// Create informational, low-risk finding
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            category: category.into(),
            component: None,
            parameter_name: String::new(),
            param_type: ParamKind::Config,
            severity: Severity::Info,
            risk_level: RiskLevel::Low,
            message: message.into(),
            details: String::new(),
            current_value: None,
            source_default: None,
            target_default: None,
            forced_value: None,
            suggestions: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach component and parameter given its flat-namespace key
    #[must_use]
    pub fn for_parameter(mut self, component: ComponentType, key: &str) -> Self {
        let (kind, name) = split_key(key);
        self.component = Some(component);
        self.parameter_name = name.to_string();
        self.param_type = kind;
        self
    }

    /// Set severity and risk level
    #[inline]
    #[must_use]
    pub fn with_level(mut self, severity: Severity, risk_level: RiskLevel) -> Self {
        self.severity = severity;
        self.risk_level = risk_level;
        self
    }

    /// Set details
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Set current, source-default and target-default values
    #[must_use]
    pub fn with_values(
        mut self,
        current: Option<&Value>,
        source_default: Option<&Value>,
        target_default: Option<&Value>,
    ) -> Self {
        self.current_value = current.cloned();
        self.source_default = source_default.cloned();
        self.target_default = target_default.cloned();
        self
    }

    /// Set forced value
    #[inline]
    #[must_use]
    pub fn with_forced_value(mut self, forced: Option<&Value>) -> Self {
        self.forced_value = forced.cloned();
        self
    }

    /// Append suggestion
    #[inline]
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Replace suggestions
    #[inline]
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Add metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether this finding records a parameter removed before rule evaluation
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.metadata
            .get(META_FILTERED)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Flat-namespace key of the parameter
    #[must_use]
    pub fn flat_key(&self) -> String {
        crate::component::flat_key(self.param_type, &self.parameter_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_sets_parameter_from_flat_key() {
        let finding = CheckResult::new("RULE", "upgrade_difference", "changed")
            .for_parameter(ComponentType::Tidb, "sysvar:tidb_txn_mode");

        assert_eq!(finding.parameter_name, "tidb_txn_mode");
        assert_eq!(finding.param_type, ParamKind::SystemVariable);
        assert_eq!(finding.flat_key(), "sysvar:tidb_txn_mode");
    }

    #[test]
    fn filtered_flag_read_from_metadata() {
        let plain = CheckResult::new("RULE", "c", "m");
        assert!(!plain.is_filtered());
        assert!(plain.clone().with_metadata(META_FILTERED, true).is_filtered());
    }

    #[test]
    fn severity_orders_and_maps_to_risk() {
        assert!(Severity::Error > Severity::Warning);
        assert_eq!(Severity::Warning.default_risk(), RiskLevel::Medium);
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
    }

    #[test]
    fn serialized_shape() {
        let finding = CheckResult::new("R", "cat", "msg")
            .for_parameter(ComponentType::Pd, "schedule.leader-schedule-limit")
            .with_level(Severity::Warning, RiskLevel::Medium)
            .with_values(Some(&Value::Int(4)), Some(&Value::Int(4)), Some(&Value::Int(8)));
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(json["component"], "pd");
        assert_eq!(json["param_type"], "config");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["target_default"], 8);
        assert!(json.get("forced_value").is_none());
    }
}
