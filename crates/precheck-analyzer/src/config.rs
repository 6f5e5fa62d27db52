//! Analyzer configuration
//!
//! Parsed from JSON, YAML or TOML text. The analyzer never reads files;
//! callers load the text and pick a [`ConfigFormat`].
//!
//! # Example
//!
//! ```rust,ignore
//! let config = AnalyzerConfig::parse(ConfigFormat::Yaml, r#"
//! focus_params:
//!   tidb: ["sysvar:tidb_mem_quota_query"]
//! disabled_rules: [HIGH_RISK_PARAMS]
//! "#)?;
//! let analyzer = Analyzer::from_config(config);
//! ```

use crate::error::ConfigError;
use precheck_model::ComponentType;
use precheck_rules::{
    ConsistencyRule, HighRiskParams, HighRiskRule, RuleSet, UpgradeDifferencesRule,
    UserModifiedRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension (without the dot)
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownFormat`] for unsupported extensions.
    pub fn from_extension(extension: &str) -> Result<Self, ConfigError> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Consistency rule settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Component kinds compared across instances
    pub components: Vec<ComponentType>,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            components: ComponentType::ALL.to_vec(),
        }
    }
}

/// Settings of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Parameters always listed in the focus index, `sysvar:` prefixed for variables
    pub focus_params: BTreeMap<ComponentType, Vec<String>>,
    /// High-risk parameter table
    pub high_risk: HighRiskParams,
    /// Consistency rule settings
    pub consistency: ConsistencyConfig,
    /// Rule names excluded from the rule set
    pub disabled_rules: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            focus_params: BTreeMap::new(),
            high_risk: HighRiskParams::builtin(),
            consistency: ConsistencyConfig::default(),
            disabled_rules: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// Returns the decoder's error wrapped in [`ConfigError`].
    pub fn parse(format: ConfigFormat, text: &str) -> Result<Self, ConfigError> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
            ConfigFormat::Toml => toml::from_str(text)?,
        };
        Ok(config)
    }

    /// Add a focus parameter
    #[must_use]
    pub fn with_focus_param(mut self, component: ComponentType, key: impl Into<String>) -> Self {
        self.focus_params.entry(component).or_default().push(key.into());
        self
    }

    /// Replace the high-risk table
    #[inline]
    #[must_use]
    pub fn with_high_risk(mut self, params: HighRiskParams) -> Self {
        self.high_risk = params;
        self
    }

    /// Restrict the consistency rule to these component kinds
    #[must_use]
    pub fn with_consistency_components(
        mut self,
        components: impl IntoIterator<Item = ComponentType>,
    ) -> Self {
        self.consistency.components = components.into_iter().collect();
        self
    }

    /// Exclude a rule by name
    #[must_use]
    pub fn with_disabled_rule(mut self, name: impl Into<String>) -> Self {
        self.disabled_rules.push(name.into());
        self
    }

    /// Build the configured rule set
    #[must_use]
    pub fn rule_set(&self) -> RuleSet {
        let mut rules = RuleSet::new();
        rules.register(UserModifiedRule::new());
        rules.register(UpgradeDifferencesRule::new());
        rules.register(
            ConsistencyRule::new().with_components(self.consistency.components.iter().copied()),
        );
        rules.register(HighRiskRule::new().with_params(self.high_risk.clone()));
        for name in &self.disabled_rules {
            if !rules.remove(name) {
                tracing::warn!("Cannot disable unknown rule {}", name);
            }
        }
        rules
    }

    /// Focus parameters as (component, flat-namespace key)
    pub fn focus_keys(&self) -> impl Iterator<Item = (ComponentType, &str)> {
        self.focus_params
            .iter()
            .flat_map(|(component, keys)| keys.iter().map(move |key| (*component, key.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_rules::{CONSISTENCY, HIGH_RISK_PARAMS};
    use pretty_assertions::assert_eq;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("YML").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_extension("toml").unwrap(), ConfigFormat::Toml);
        assert!(matches!(
            ConfigFormat::from_extension("ini"),
            Err(ConfigError::UnknownFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn defaults_use_builtin_table() {
        let config = AnalyzerConfig::parse(ConfigFormat::Json, "{}").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.high_risk.len(), 4);
        assert_eq!(config.rule_set().len(), 4);
    }

    #[test]
    fn yaml_config() {
        let config = AnalyzerConfig::parse(
            ConfigFormat::Yaml,
            r#"
focus_params:
  tidb: ["sysvar:tidb_mem_quota_query"]
disabled_rules: [HIGH_RISK_PARAMS]
consistency:
  components: [tikv]
"#,
        )
        .unwrap();

        assert_eq!(
            config.focus_keys().collect::<Vec<_>>(),
            [(ComponentType::Tidb, "sysvar:tidb_mem_quota_query")]
        );
        assert_eq!(config.consistency.components, [ComponentType::Tikv]);
        let rules = config.rule_set();
        assert!(!rules.contains(HIGH_RISK_PARAMS));
        assert!(rules.contains(CONSISTENCY));
    }

    #[test]
    fn toml_config() {
        let config = AnalyzerConfig::parse(
            ConfigFormat::Toml,
            r#"
disabled_rules = ["CONSISTENCY"]

[focus_params]
tikv = ["raftstore.apply-pool-size"]

[high_risk.pd.config."schedule.max-merge-region-size"]
severity = "error"
"#,
        )
        .unwrap();

        assert_eq!(config.high_risk.len(), 1);
        assert!(!config.rule_set().contains(CONSISTENCY));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = AnalyzerConfig::parse(ConfigFormat::Json, "{\"disabled_rules\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn builder_matches_parsed() {
        let built = AnalyzerConfig::new()
            .with_focus_param(ComponentType::Tikv, "raftstore.apply-pool-size")
            .with_disabled_rule("CONSISTENCY");
        let parsed = AnalyzerConfig::parse(
            ConfigFormat::Json,
            r#"{
                "focus_params": {"tikv": ["raftstore.apply-pool-size"]},
                "disabled_rules": ["CONSISTENCY"]
            }"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }
}
