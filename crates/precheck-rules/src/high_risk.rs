//! Explicitly listed high-risk parameters
//!
//! Operators (or the built-in table) name parameters whose values deserve
//! attention within a release range, e.g. knobs whose default changes cause
//! regressions on small nodes.
//!
//! # Example
//!
//! ```rust,ignore
//! let params = HighRiskParams::from_json(r#"{
//!     "tikv": { "config": { "raftstore.store-pool-size": { "severity": "error" } } }
//! }"#)?;
//! let rule = HighRiskRule::new().with_params(params);
//! ```

use crate::context::RuleContext;
use crate::requirements::DataRequirements;
use crate::rule::{Rule, RuleError};
use precheck_model::{
    flat_key, format_value, values_equal, CheckResult, ComponentType, ModelError, ParamKind,
    ReleaseVersion, Severity, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule identifier
pub const HIGH_RISK_PARAMS: &str = "HIGH_RISK_PARAMS";

/// Finding category
pub const HIGH_RISK_CATEGORY: &str = "high_risk";

const GRPC_NOTE: &str = "Default value change for this parameter may cause performance \
    regression in environments with 16 cores or less. Please review the new default value and \
    consider adjusting if your TiKV nodes have 16 CPU cores or fewer.";

/// One listed parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskParam {
    /// Reported severity
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Why the parameter is risky
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Values that are never reported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<Value>,
    /// Only report values that differ from the source default
    #[serde(default)]
    pub check_modified: bool,
    /// First release the entry applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_version: Option<String>,
    /// Release the entry stops applying at (exclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_version: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Warning
}

impl HighRiskParam {
    /// Create warning-level entry
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            description: description.into(),
            allowed_values: Vec::new(),
            check_modified: false,
            from_version: None,
            to_version: None,
        }
    }

    /// Only report customized values
    #[inline]
    #[must_use]
    pub fn checking_modified(mut self) -> Self {
        self.check_modified = true;
        self
    }

    /// Set severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set release range
    #[must_use]
    pub fn with_versions(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from_version = from.map(str::to_string);
        self.to_version = to.map(str::to_string);
        self
    }

    /// Add an allowed value
    #[must_use]
    pub fn with_allowed(mut self, value: impl Into<Value>) -> Self {
        self.allowed_values.push(value.into());
        self
    }
}

/// Listed parameters of one component kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighRiskTables {
    /// Config parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, HighRiskParam>,
    /// System variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub system_variables: BTreeMap<String, HighRiskParam>,
}

/// The high-risk parameter table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighRiskParams {
    components: BTreeMap<ComponentType, HighRiskTables>,
}

impl HighRiskParams {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_param(
                ComponentType::Tidb,
                ParamKind::SystemVariable,
                "tidb_distsql_scan_concurrency",
                HighRiskParam::new(
                    "In v8.5+, ANALYZE operations use a separate parameter \
                     'tidb_analyze_distsql_scan_concurrency'. The current parameter \
                     'tidb_distsql_scan_concurrency' now only controls concurrency for \
                     non-ANALYZE scenarios. If you have customized this parameter for ANALYZE \
                     operations, you may need to set 'tidb_analyze_distsql_scan_concurrency' \
                     separately.",
                )
                .checking_modified()
                .with_versions(Some("v8.5.0"), None),
            )
            .with_param(
                ComponentType::Tikv,
                ParamKind::Config,
                "server.grpc-concurrency",
                HighRiskParam::new(GRPC_NOTE)
                    .checking_modified()
                    .with_versions(Some("v8.5.0"), None),
            )
            .with_param(
                ComponentType::Tikv,
                ParamKind::Config,
                "server.grpc-raft-conn-num",
                HighRiskParam::new(GRPC_NOTE)
                    .checking_modified()
                    .with_versions(Some("v8.5.0"), None),
            )
            .with_param(
                ComponentType::Tikv,
                ParamKind::Config,
                "coprocessor.region-split-size",
                HighRiskParam::new(
                    "The default value has changed from 96MB to 256MB in the target version. \
                     If this parameter was not explicitly set in your current cluster, it keeps \
                     using 96MB after upgrade. Set it explicitly after upgrade to adopt the new \
                     default.",
                )
                .with_versions(Some("v8.5.0"), None),
            )
    }

    /// Add an entry
    #[must_use]
    pub fn with_param(
        mut self,
        component: ComponentType,
        kind: ParamKind,
        name: impl Into<String>,
        param: HighRiskParam,
    ) -> Self {
        let tables = self.components.entry(component).or_default();
        let table = match kind {
            ParamKind::Config => &mut tables.config,
            ParamKind::SystemVariable => &mut tables.system_variables,
        };
        table.insert(name.into(), param);
        self
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::decode("high-risk parameters", e))
    }

    /// Every entry as (component, kind, name, entry)
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (ComponentType, ParamKind, &str, &HighRiskParam)> {
        self.components.iter().flat_map(|(component, tables)| {
            let config = tables
                .config
                .iter()
                .map(move |(name, p)| (*component, ParamKind::Config, name.as_str(), p));
            let sysvars = tables
                .system_variables
                .iter()
                .map(move |(name, p)| (*component, ParamKind::SystemVariable, name.as_str(), p));
            config.chain(sysvars)
        })
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reports listed parameters whose values are risky for this upgrade
#[derive(Debug, Clone)]
pub struct HighRiskRule {
    params: HighRiskParams,
}

impl Default for HighRiskRule {
    fn default() -> Self {
        Self::new()
    }
}

impl HighRiskRule {
    /// Create rule with the built-in table
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: HighRiskParams::builtin(),
        }
    }

    /// Replace the table
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: HighRiskParams) -> Self {
        self.params = params;
        self
    }

    fn version(text: Option<&str>) -> Result<Option<ReleaseVersion>, RuleError> {
        text.filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<ReleaseVersion>()
                    .map_err(|_| RuleError::invalid(HIGH_RISK_PARAMS, format!("bad version {t:?}")))
            })
            .transpose()
    }

    fn check(
        ctx: &RuleContext<'_>,
        component: ComponentType,
        key: &str,
        param: &HighRiskParam,
    ) -> Option<CheckResult> {
        let current = ctx.current_value(component, key)?;
        let source = ctx.raw_source_default(component, key);
        if param.check_modified && source.map_or(true, |s| values_equal(Some(current), Some(s))) {
            return None;
        }
        if param
            .allowed_values
            .iter()
            .any(|allowed| values_equal(Some(current), Some(allowed)))
        {
            return None;
        }

        let mut details = format!("Current value: {}", format_value(Some(current)));
        if !param.description.is_empty() {
            details.push_str("\nReason: ");
            details.push_str(&param.description);
        }
        if param.check_modified {
            details.push_str(&format!("\nSource default: {}", format_value(source)));
        }
        if !param.allowed_values.is_empty() {
            let allowed: Vec<String> = param
                .allowed_values
                .iter()
                .map(|v| format_value(Some(v)))
                .collect();
            details.push_str(&format!("\nAllowed values: {}", allowed.join(", ")));
        }

        let mut result = CheckResult::new(HIGH_RISK_PARAMS, HIGH_RISK_CATEGORY, String::new())
            .for_parameter(component, key)
            .with_level(param.severity, param.severity.default_risk())
            .with_details(details)
            .with_values(Some(current), source, ctx.raw_target_default(component, key))
            .with_suggestions(vec![
                "Review this high-risk parameter and its current value".to_string(),
                "Ensure the value is appropriate for your workload".to_string(),
            ])
            .with_metadata("is_high_risk", true);
        if let Some(from) = &param.from_version {
            result = result.with_metadata("from_version", from.as_str());
        }
        if let Some(to) = &param.to_version {
            result = result.with_metadata("to_version", to.as_str());
        }
        result.message = format!(
            "High-risk parameter {} found in {component}",
            result.parameter_name
        );
        Some(result)
    }
}

impl Rule for HighRiskRule {
    fn name(&self) -> &'static str {
        HIGH_RISK_PARAMS
    }

    fn description(&self) -> &'static str {
        "Check for manually specified high-risk parameters across all components"
    }

    fn category(&self) -> &'static str {
        HIGH_RISK_CATEGORY
    }

    fn data_requirements(&self) -> DataRequirements {
        DataRequirements::for_components(self.params.entries().map(|(component, ..)| component))
            .with_config()
            .with_system_variables()
            .with_source_defaults()
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError> {
        let mut results = Vec::new();
        for (component, kind, name, param) in self.params.entries() {
            let from = Self::version(param.from_version.as_deref())?;
            let to = Self::version(param.to_version.as_deref())?;
            if !ctx.path().overlaps(from, to) {
                continue;
            }
            if let Some(result) = Self::check(ctx, component, &flat_key(kind, name), param) {
                results.push(result);
            }
        }
        tracing::debug!(findings = results.len(), "high-risk rule evaluated");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Catalog, Catalogs, InstanceGroups};
    use precheck_model::{ClusterSnapshot, ComponentState, ParameterValue, RiskLevel, UpgradePath};
    use pretty_assertions::assert_eq;

    fn snapshot(grpc: i64, split: &str) -> ClusterSnapshot {
        ClusterSnapshot::new("v7.5.0", "v8.5.0").with_instance(
            "tikv-a",
            ComponentState::new(ComponentType::Tikv, "v7.5.0")
                .with_config("server.grpc-concurrency", ParameterValue::new(grpc))
                .with_config("coprocessor.region-split-size", ParameterValue::new(split)),
        )
    }

    fn run(
        rule: &HighRiskRule,
        snapshot: &ClusterSnapshot,
        to: &str,
    ) -> Result<Vec<CheckResult>, RuleError> {
        let raw = Catalogs::from([(
            ComponentType::Tikv,
            Catalog::from([(
                "server.grpc-concurrency".to_string(),
                ParameterValue::new(5_i64),
            )]),
        )]);
        let groups = InstanceGroups::from([(ComponentType::Tikv, vec!["tikv-a".to_string()])]);
        let ctx = RuleContext::new(snapshot, UpgradePath::new("v7.5.0", to))
            .with_instances(groups)
            .with_raw_defaults(raw, Catalogs::new());
        rule.evaluate(&ctx)
    }

    #[test]
    fn builtin_table_shape() {
        let params = HighRiskParams::builtin();
        assert_eq!(params.len(), 4);
        assert!(params.entries().any(|(c, k, n, _)| {
            c == ComponentType::Tidb
                && k == ParamKind::SystemVariable
                && n == "tidb_distsql_scan_concurrency"
        }));
    }

    #[test]
    fn modified_grpc_and_any_split_size_reported() {
        let results = run(&HighRiskRule::new(), &snapshot(10, "96MiB"), "v8.5.0").unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.parameter_name.as_str()).collect();
        assert_eq!(names, ["coprocessor.region-split-size", "server.grpc-concurrency"]);
        assert!(results.iter().all(|r| r.risk_level == RiskLevel::Medium));
        assert_eq!(results[1].metadata["is_high_risk"], serde_json::json!(true));
        assert!(results[1].details.contains("Source default: 5"));
    }

    #[test]
    fn default_grpc_not_reported() {
        let results = run(&HighRiskRule::new(), &snapshot(5, "96MiB"), "v8.5.0").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].parameter_name, "coprocessor.region-split-size");
    }

    #[test]
    fn out_of_range_upgrade_skipped() {
        let results = run(&HighRiskRule::new(), &snapshot(10, "96MiB"), "v8.1.0").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn allowed_values_suppress() {
        let params = HighRiskParams::new().with_param(
            ComponentType::Tikv,
            ParamKind::Config,
            "server.grpc-concurrency",
            HighRiskParam::new("").with_severity(Severity::Error).with_allowed(10_i64),
        );
        let rule = HighRiskRule::new().with_params(params);
        assert!(run(&rule, &snapshot(10, "96MiB"), "v8.5.0").unwrap().is_empty());

        let results = run(&rule, &snapshot(12, "96MiB"), "v8.5.0").unwrap();
        assert_eq!(results[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn bad_version_is_rule_error() {
        let params = HighRiskParams::new().with_param(
            ComponentType::Tikv,
            ParamKind::Config,
            "server.grpc-concurrency",
            HighRiskParam::new("").with_versions(Some("latest"), None),
        );
        let rule = HighRiskRule::new().with_params(params);
        let err = run(&rule, &snapshot(10, "96MiB"), "v8.5.0").unwrap_err();
        assert_eq!(err.rule(), HIGH_RISK_PARAMS);
    }

    #[test]
    fn table_from_json() {
        let params = HighRiskParams::from_json(
            r#"{"tikv": {"config": {
                "raftstore.store-pool-size": {"severity": "error", "check_modified": true}
            }}}"#,
        )
        .unwrap();
        let (component, kind, name, param) = params.entries().next().unwrap();
        assert_eq!(
            (component, kind, name),
            (ComponentType::Tikv, ParamKind::Config, "raftstore.store-pool-size")
        );
        assert_eq!(param.severity, Severity::Error);
        assert!(param.check_modified);
        assert!(HighRiskParams::from_json("{\"unknown\": {}}").is_err());
    }
}
