//! Upgrade-difference detection: the risk matrix
//!
//! For every retained parameter of each component kind, compares each
//! instance's current value with the source and target defaults and with the
//! in-range forced changes. Instances sharing a value share one finding; when
//! instances disagree, each finding lists its instances.
//!
//! # Core Concepts
//!
//! - **State**: [`ParamState::UseDefault`] when the current value equals the
//!   source default under the value comparator, [`ParamState::UserSet`]
//!   otherwise.
//! - **Forced precedence**: a parameter named by an in-range forced change is
//!   always reported HIGH; no other classification is attempted for it.
//! - **Drift behavior**: whether a changed default actually reaches the
//!   running cluster depends on (component, kind). See [`DriftBehavior`].
//!
//! # Example
//!
//! ```rust,ignore
//! use precheck_rules::upgrade_differences::{classify, Classification};
//!
//! let five = Value::Int(5);
//! let ten = Value::Int(10);
//! assert_eq!(
//!     classify(Some(&five), Some(&five), Some(&ten)),
//!     Some(Classification::DefaultChanged)
//! );
//! ```

use crate::context::RuleContext;
use crate::diff::{differing_fields, field_key, is_map_parameter};
use crate::requirements::DataRequirements;
use crate::rule::{Rule, RuleError};
use precheck_model::{
    format_three_way, format_value, split_key, values_equal, CheckResult, ComponentType,
    ForcedChange, ParamKind, RiskLevel, Severity, Value,
};
use std::collections::BTreeSet;

/// Rule identifier
pub const UPGRADE_DIFFERENCES: &str = "UPGRADE_DIFFERENCES";

/// Finding category
pub const UPGRADE_DIFFERENCE_CATEGORY: &str = "upgrade_difference";

const FORCED_SUGGESTIONS: [&str; 2] = [
    "This parameter will be forcibly changed during upgrade",
    "Review the forced change and its impact",
];

const FORCED_MATCH_SUGGESTIONS: [&str; 2] = [
    "Default value has changed in target version",
    "Your current value matches the forced value, so no change will occur",
];

/// Whether the current value matches the source default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamState {
    /// Current equals source default
    UseDefault,
    /// Current was set explicitly
    UserSet,
}

impl ParamState {
    /// Determine state under the value comparator
    #[must_use]
    pub fn of(current: Option<&Value>, source_default: Option<&Value>) -> Self {
        if values_equal(current, source_default) {
            Self::UseDefault
        } else {
            Self::UserSet
        }
    }
}

/// How a changed default reaches the running cluster
///
/// | Component | Kind | Behavior |
/// |---|---|---|
/// | tidb | system variable | keeps current value |
/// | pd | config | keeps current value |
/// | any other | any | new default applies on restart |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftBehavior {
    /// Old value survives the upgrade unless forced
    KeepsCurrent,
    /// New default takes effect when the process restarts
    AppliesOnRestart,
}

impl DriftBehavior {
    /// Branch table lookup
    #[must_use]
    pub fn for_parameter(component: ComponentType, kind: ParamKind) -> Self {
        match (component, kind) {
            (ComponentType::Tidb, ParamKind::SystemVariable)
            | (ComponentType::Pd, ParamKind::Config) => Self::KeepsCurrent,
            _ => Self::AppliesOnRestart,
        }
    }

    /// Severity and risk of a drift under this behavior
    #[must_use]
    pub fn level(self) -> (Severity, RiskLevel) {
        match self {
            Self::KeepsCurrent => (Severity::Info, RiskLevel::Low),
            Self::AppliesOnRestart => (Severity::Warning, RiskLevel::Medium),
        }
    }

    /// Whether the target default will replace the current value
    #[inline]
    #[must_use]
    pub fn applies_new_defaults(self) -> bool {
        self == Self::AppliesOnRestart
    }

    fn note(component: ComponentType) -> &'static str {
        match component {
            ComponentType::Pd => "PD maintains existing configuration",
            _ => "TiDB system variables keep old values",
        }
    }
}

/// Outcome of comparing one non-forced parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Current follows the source default and the default changes
    DefaultChanged,
    /// Current was customized and differs from the target default
    CustomDiverges,
    /// Only the target release defines the parameter
    NewParameter,
    /// Only the source release defines the parameter
    RemovedParameter,
    /// Defaults differ but the current value was not collected
    Undetermined,
}

/// Classify a non-forced parameter; `None` means nothing to report
#[must_use]
pub fn classify(
    current: Option<&Value>,
    source: Option<&Value>,
    target: Option<&Value>,
) -> Option<Classification> {
    match (current, source, target) {
        (_, None, None) => None,
        (_, None, Some(_)) => Some(Classification::NewParameter),
        (Some(_), Some(_), None) => Some(Classification::RemovedParameter),
        (None, Some(_), None) => None,
        (None, Some(_), Some(_)) => {
            (!values_equal(source, target)).then_some(Classification::Undetermined)
        }
        (Some(_), Some(_), Some(_)) => match ParamState::of(current, source) {
            ParamState::UseDefault => {
                (!values_equal(source, target)).then_some(Classification::DefaultChanged)
            }
            ParamState::UserSet => {
                (!values_equal(current, target)).then_some(Classification::CustomDiverges)
            }
        },
    }
}

/// Flags forced changes and default drift between source and target
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeDifferencesRule;

impl UpgradeDifferencesRule {
    /// Create rule
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn forced(
        ctx: &RuleContext<'_>,
        component: ComponentType,
        key: &str,
        current: Option<&Value>,
        change: &ForcedChange,
    ) -> CheckResult {
        let forced = change.forced_value.as_ref();
        let target = ctx.raw_target_default(component, key);
        let matches = values_equal(current, forced);

        let mut details = if matches {
            format!(
                "Current value matches forced value.\n\nCurrent: {}\nTarget Default: {}",
                format_value(current),
                format_value(target)
            )
        } else {
            format!(
                "Will be forced to: {}\n\nCurrent: {}\nTarget Default: {}",
                format_value(forced),
                format_value(current),
                format_value(target)
            )
        };
        if let Some(description) = &change.description {
            details.push_str("\n\nReason: ");
            details.push_str(description);
        }
        if let Some(note) = &change.details_note {
            details.push_str("\n\n");
            details.push_str(note);
        }

        let default_suggestions = if matches {
            FORCED_MATCH_SUGGESTIONS
        } else {
            FORCED_SUGGESTIONS
        };
        let suggestions = if change.suggestions.is_empty() {
            default_suggestions.iter().map(ToString::to_string).collect()
        } else {
            change.suggestions.clone()
        };
        let severity = change.report_severity.unwrap_or(if matches {
            Severity::Warning
        } else {
            Severity::Error
        });

        let mut result =
            CheckResult::new(UPGRADE_DIFFERENCES, UPGRADE_DIFFERENCE_CATEGORY, String::new())
                .for_parameter(component, key)
                .with_level(severity, RiskLevel::High)
                .with_details(details)
                .with_values(current, ctx.raw_source_default(component, key), target)
                .with_forced_value(forced)
                .with_suggestions(suggestions)
                .with_metadata("forced", true)
                .with_metadata("scope", change.scope.as_str());
        result.message = if matches {
            format!(
                "Parameter {} in {component} already matches forced value \
                 (forced change during upgrade)",
                result.parameter_name
            )
        } else {
            format!(
                "Parameter {} in {component} will be forcibly changed during upgrade \
                 (forced value differs from current)",
                result.parameter_name
            )
        };
        result
    }

    fn drift(
        ctx: &RuleContext<'_>,
        component: ComponentType,
        key: &str,
        values: [Option<&Value>; 3],
        classification: Classification,
    ) -> CheckResult {
        let [current, source, target] = values;
        let (kind, name) = split_key(key);
        let behavior = DriftBehavior::for_parameter(component, kind);
        let display = name.to_string();

        let (severity, risk) = match classification {
            Classification::DefaultChanged | Classification::CustomDiverges => behavior.level(),
            _ => (Severity::Info, RiskLevel::Low),
        };
        let (message, suggestions): (String, [&str; 2]) = match classification {
            Classification::DefaultChanged | Classification::CustomDiverges
                if behavior == DriftBehavior::KeepsCurrent =>
            {
                (
                    "default value changed (current value will be kept)".into(),
                    [
                        "Default value has changed in target version",
                        "Review if the new default is acceptable",
                    ],
                )
            }
            Classification::DefaultChanged => (
                "default value changed (target default differs from current)".into(),
                [
                    "Default value has changed in target version",
                    "Review if the new default is acceptable",
                ],
            ),
            Classification::CustomDiverges => (
                "customized value differs from target default".into(),
                [
                    "Your customization will diverge further from target defaults",
                    "Verify the customized value is still appropriate for target version",
                ],
            ),
            Classification::NewParameter if current.is_some() => (
                "is new (added in target version, already configured in cluster)".into(),
                [
                    "This is a new parameter in target version",
                    "Review the new parameter and its default value",
                ],
            ),
            Classification::NewParameter => (
                "is new (added in target version)".into(),
                [
                    "This is a new parameter in target version",
                    "Consider configuring it if needed",
                ],
            ),
            Classification::RemovedParameter => (
                "is removed in target version".into(),
                [
                    "This parameter no longer exists in target version",
                    "Remove it from configuration files before upgrading",
                ],
            ),
            Classification::Undetermined => (
                "cannot determine upgrade impact (current value not collected)".into(),
                [
                    "Default value has changed in target version",
                    "Collect the current value to assess the impact",
                ],
            ),
        };

        let mut details = format_three_way(current, source, target);
        if matches!(
            classification,
            Classification::DefaultChanged | Classification::CustomDiverges
        ) && behavior == DriftBehavior::KeepsCurrent
        {
            details.push_str("\n\nCurrent value will be kept.\n\n");
            details.push_str(DriftBehavior::note(component));
        }
        if let Some(note) = ctx.parameter_note(component, kind, &display, target) {
            details.push_str("\n\n");
            details.push_str(note);
        }

        let mut result =
            CheckResult::new(UPGRADE_DIFFERENCES, UPGRADE_DIFFERENCE_CATEGORY, String::new())
                .for_parameter(component, key)
                .with_level(severity, risk)
                .with_details(details)
                .with_values(current, source, target)
                .with_suggestions(suggestions.iter().map(ToString::to_string).collect());
        if classification == Classification::Undetermined {
            result = result.with_metadata("undetermined", true);
        }
        result.message = format!("Parameter {display} in {component}: {message}");
        result
    }

    fn compare(
        ctx: &RuleContext<'_>,
        component: ComponentType,
        key: &str,
        values: [Option<&Value>; 3],
    ) -> Vec<CheckResult> {
        let [current, source, target] = values;
        if is_map_parameter(&values) {
            return differing_fields(current, source, target)
                .into_iter()
                .filter_map(|field| {
                    let leaf = [field.current, field.source, field.target];
                    let field_key = field_key(key, &field.path);
                    classify(field.current, field.source, field.target).map(|classification| {
                        Self::drift(ctx, component, &field_key, leaf, classification)
                    })
                })
                .collect();
        }
        classify(current, source, target)
            .map(|classification| Self::drift(ctx, component, key, values, classification))
            .into_iter()
            .collect()
    }
}

/// Scope a finding to the instances holding its current value
fn on_instances(mut result: CheckResult, instances: &[&str]) -> CheckResult {
    result.details.push_str("\n\nInstances: ");
    result.details.push_str(&instances.join(", "));
    result.with_metadata("instances", instances.to_vec())
}

impl Rule for UpgradeDifferencesRule {
    fn name(&self) -> &'static str {
        UPGRADE_DIFFERENCES
    }

    fn description(&self) -> &'static str {
        "Detect forced changes and default-value drift between source and target versions"
    }

    fn category(&self) -> &'static str {
        UPGRADE_DIFFERENCE_CATEGORY
    }

    fn data_requirements(&self) -> DataRequirements {
        DataRequirements::all_components()
            .with_config()
            .with_system_variables()
            .with_source_defaults()
            .with_target_defaults()
            .with_forced_changes()
            .with_all_instances()
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError> {
        let mut results = Vec::new();
        for component in ctx.components() {
            let mut keys: BTreeSet<&str> = BTreeSet::new();
            for catalog in [ctx.source_catalog(component), ctx.target_catalog(component)]
                .into_iter()
                .flatten()
            {
                keys.extend(catalog.keys().map(String::as_str));
            }
            if let Some(forced) = ctx.forced_changes(component) {
                keys.extend(forced.keys().map(String::as_str));
            }

            for key in keys {
                let groups = ctx.value_groups(component, key);
                let split = groups.len() > 1;
                for group in groups {
                    let current = group.value;
                    let found = match ctx.forced_change_for(component, key, current) {
                        Some(change) => vec![Self::forced(ctx, component, key, current, change)],
                        None => {
                            let values = [
                                current,
                                ctx.source_default(component, key),
                                ctx.target_default(component, key),
                            ];
                            Self::compare(ctx, component, key, values)
                        }
                    };
                    if split {
                        results.extend(
                            found
                                .into_iter()
                                .map(|result| on_instances(result, &group.instances)),
                        );
                    } else {
                        results.extend(found);
                    }
                }
            }
        }
        tracing::debug!(findings = results.len(), "upgrade-differences rule evaluated");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Catalog, Catalogs, InstanceGroups};
    use precheck_model::{
        ClusterSnapshot, ComponentState, ForcedChangeCatalog, ParameterNote, ParameterNotes,
        ParameterValue, UpgradePath, UpgradeStep,
    };
    use pretty_assertions::assert_eq;

    struct Fixture {
        snapshot: ClusterSnapshot,
        source: Catalogs,
        target: Catalogs,
        forced: ForcedChangeCatalog,
        notes: ParameterNotes,
    }

    impl Fixture {
        fn new(component: ComponentType, state: ComponentState) -> Self {
            Self {
                snapshot: ClusterSnapshot::new("v7.5.0", "v8.5.0")
                    .with_instance(component.as_str(), state),
                source: Catalogs::from([(component, Catalog::new())]),
                target: Catalogs::from([(component, Catalog::new())]),
                forced: ForcedChangeCatalog::new(),
                notes: ParameterNotes::new(),
            }
        }

        fn defaults(
            mut self,
            component: ComponentType,
            key: &str,
            source: Option<Value>,
            target: Option<Value>,
        ) -> Self {
            for (catalogs, value) in [(&mut self.source, source), (&mut self.target, target)] {
                if let Some(value) = value {
                    catalogs
                        .entry(component)
                        .or_default()
                        .insert(key.to_string(), ParameterValue::new(value));
                }
            }
            self
        }

        fn run(&self) -> Vec<CheckResult> {
            let instances = self
                .snapshot
                .components
                .iter()
                .filter_map(|(name, state)| state.declared_type().map(|t| (t, vec![name.clone()])))
                .collect::<InstanceGroups>();
            let ctx = RuleContext::new(&self.snapshot, UpgradePath::new("v7.5.0", "v8.5.0"))
                .with_instances(instances)
                .with_defaults(self.source.clone(), self.target.clone())
                .with_forced_changes(&self.forced)
                .with_notes(&self.notes);
            UpgradeDifferencesRule::new().evaluate(&ctx).unwrap()
        }
    }

    #[test]
    fn classify_matrix() {
        use Classification::{
            CustomDiverges, DefaultChanged, NewParameter, RemovedParameter, Undetermined,
        };
        let values = [Value::Int(5), Value::Int(10), Value::Int(7)];
        let [five, ten, seven] = [&values[0], &values[1], &values[2]].map(Some);
        assert_eq!(classify(five, five, ten), Some(DefaultChanged));
        assert_eq!(classify(five, five, five), None);
        assert_eq!(classify(seven, five, ten), Some(CustomDiverges));
        assert_eq!(classify(ten, five, ten), None);
        assert_eq!(classify(None, None, ten), Some(NewParameter));
        assert_eq!(classify(five, five, None), Some(RemovedParameter));
        assert_eq!(classify(None, five, ten), Some(Undetermined));
        assert_eq!(classify(None, five, five), None);
    }

    #[test]
    fn state_uses_comparator() {
        assert_eq!(
            ParamState::of(
                Some(&Value::Duration("1m".into())),
                Some(&Value::Duration("60s".into()))
            ),
            ParamState::UseDefault
        );
        assert_eq!(ParamState::of(Some(&Value::Int(1)), None), ParamState::UserSet);
    }

    #[test]
    fn drift_branch_table() {
        assert_eq!(
            DriftBehavior::for_parameter(ComponentType::Tidb, ParamKind::SystemVariable),
            DriftBehavior::KeepsCurrent
        );
        assert_eq!(
            DriftBehavior::for_parameter(ComponentType::Pd, ParamKind::Config),
            DriftBehavior::KeepsCurrent
        );
        assert_eq!(
            DriftBehavior::for_parameter(ComponentType::Tidb, ParamKind::Config),
            DriftBehavior::AppliesOnRestart
        );
        assert_eq!(
            DriftBehavior::for_parameter(ComponentType::Tikv, ParamKind::Config),
            DriftBehavior::AppliesOnRestart
        );
    }

    #[test]
    fn default_change_is_medium() {
        let state = ComponentState::new(ComponentType::Tikv, "v7.5.0")
            .with_config("raftstore.apply-pool-size", ParameterValue::new(5_i64));
        let results = Fixture::new(ComponentType::Tikv, state)
            .defaults(
                ComponentType::Tikv,
                "raftstore.apply-pool-size",
                Some(Value::Int(5)),
                Some(Value::Int(10)),
            )
            .run();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].risk_level, RiskLevel::Medium);
        assert_eq!(results[0].severity, Severity::Warning);
        assert!(results[0].message.contains("default value changed"));
        assert_eq!(results[0].current_value, Some(Value::Int(5)));
    }

    #[test]
    fn pd_config_drift_is_informational() {
        let state = ComponentState::new(ComponentType::Pd, "v7.5.0")
            .with_config("schedule.max-merge-region-size", ParameterValue::new(20_i64));
        let results = Fixture::new(ComponentType::Pd, state)
            .defaults(
                ComponentType::Pd,
                "schedule.max-merge-region-size",
                Some(Value::Int(20)),
                Some(Value::Int(54)),
            )
            .run();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].risk_level, RiskLevel::Low);
        assert!(results[0].details.contains("PD maintains existing configuration"));
    }

    #[test]
    fn tidb_sysvar_drift_is_informational() {
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0")
            .with_variable("tidb_enable_paging", ParameterValue::new("OFF"));
        let results = Fixture::new(ComponentType::Tidb, state)
            .defaults(
                ComponentType::Tidb,
                "sysvar:tidb_enable_paging",
                Some(Value::Bool(false)),
                Some(Value::Bool(true)),
            )
            .run();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].param_type, ParamKind::SystemVariable);
        assert_eq!(results[0].parameter_name, "tidb_enable_paging");
        assert_eq!(results[0].severity, Severity::Info);
        assert!(results[0].details.contains("TiDB system variables keep old values"));
    }

    #[test]
    fn forced_change_wins_even_when_all_equal() {
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0")
            .with_variable("tidb_enable_async_merge_global_stats", ParameterValue::new("OFF"));
        let mut fixture = Fixture::new(ComponentType::Tidb, state).defaults(
            ComponentType::Tidb,
            "sysvar:tidb_enable_async_merge_global_stats",
            Some(Value::from("OFF")),
            Some(Value::from("OFF")),
        );
        fixture.forced = ForcedChangeCatalog::new().with_step(
            ComponentType::Tidb,
            UpgradeStep::new(
                "v8.0.0",
                vec![ForcedChange::new(
                    ParamKind::SystemVariable,
                    "tidb_enable_async_merge_global_stats",
                    "ON",
                )
                .with_description("enabled by upgrade")],
            ),
        );

        let results = fixture.run();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].risk_level, RiskLevel::High);
        assert_eq!(results[0].severity, Severity::Error);
        assert_eq!(results[0].forced_value, Some(Value::from("ON")));
        assert!(results[0].details.contains("Reason: enabled by upgrade"));
    }

    #[test]
    fn forced_without_current_or_defaults_still_reported() {
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0");
        let mut fixture = Fixture::new(ComponentType::Tidb, state);
        fixture.forced = ForcedChangeCatalog::new().with_step(
            ComponentType::Tidb,
            UpgradeStep::new(
                "v8.1.0",
                vec![ForcedChange::new(ParamKind::SystemVariable, "tidb_schema_cache_size", 0_i64)
                    .with_report_severity(Severity::Warning)],
            ),
        );

        let results = fixture.run();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].risk_level, RiskLevel::High);
        assert_eq!(results[0].severity, Severity::Warning);
    }

    #[test]
    fn forced_value_matching_current_is_warning() {
        let state = ComponentState::new(ComponentType::Tikv, "v7.5.0")
            .with_config("storage.engine", ParameterValue::new("raft-kv"));
        let mut fixture = Fixture::new(ComponentType::Tikv, state);
        fixture.forced = ForcedChangeCatalog::new().with_step(
            ComponentType::Tikv,
            UpgradeStep::new(
                "v8.5.0",
                vec![ForcedChange::new(ParamKind::Config, "storage.engine", "raft-kv")],
            ),
        );

        let results = fixture.run();

        assert_eq!(results[0].severity, Severity::Warning);
        assert_eq!(results[0].risk_level, RiskLevel::High);
        assert!(results[0].message.contains("already matches forced value"));
    }

    #[test]
    fn every_instance_value_is_classified() {
        let tikv = |pool: i64| {
            ComponentState::new(ComponentType::Tikv, "v7.5.0")
                .with_config("raftstore.apply-pool-size", ParameterValue::new(pool))
        };
        let snapshot = ClusterSnapshot::new("v7.5.0", "v8.5.0")
            .with_instance("tikv-a", tikv(5))
            .with_instance("tikv-b", tikv(7))
            .with_instance("tikv-c", tikv(5));
        let catalog = |value: i64| {
            Catalogs::from([(
                ComponentType::Tikv,
                Catalog::from([(
                    "raftstore.apply-pool-size".to_string(),
                    ParameterValue::new(value),
                )]),
            )])
        };
        let names = ["tikv-a", "tikv-b", "tikv-c"].map(String::from).to_vec();
        let ctx = RuleContext::new(&snapshot, UpgradePath::new("v7.5.0", "v8.5.0"))
            .with_instances(InstanceGroups::from([(ComponentType::Tikv, names)]))
            .with_defaults(catalog(5), catalog(5));

        let results = UpgradeDifferencesRule::new().evaluate(&ctx).unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].message.contains("customized value differs from target default"));
        assert_eq!(results[0].current_value, Some(Value::Int(7)));
        assert_eq!(results[0].metadata["instances"], serde_json::json!(["tikv-b"]));
        assert!(results[0].details.ends_with("Instances: tikv-b"));
    }

    #[test]
    fn new_and_removed_parameters() {
        let state = ComponentState::new(ComponentType::Tikv, "v7.5.0")
            .with_config("old-knob", ParameterValue::new(1_i64));
        let results = Fixture::new(ComponentType::Tikv, state)
            .defaults(ComponentType::Tikv, "new-knob", None, Some(Value::Int(3)))
            .defaults(ComponentType::Tikv, "old-knob", Some(Value::Int(1)), None)
            .run();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].parameter_name, "new-knob");
        assert!(results[0].message.contains("is new"));
        assert_eq!(results[1].parameter_name, "old-knob");
        assert!(results[1].message.contains("removed"));
        assert!(results.iter().all(|r| r.risk_level == RiskLevel::Low));
    }

    #[test]
    fn parameter_note_appended() {
        let state = ComponentState::new(ComponentType::Tikv, "v7.5.0")
            .with_config("raftstore.store-io-pool-size", ParameterValue::new(0_i64));
        let mut fixture = Fixture::new(ComponentType::Tikv, state).defaults(
            ComponentType::Tikv,
            "raftstore.store-io-pool-size",
            Some(Value::Int(0)),
            Some(Value::Int(1)),
        );
        fixture.notes = ParameterNotes::new().with_note(
            ComponentType::Tikv,
            ParamKind::Config,
            "raftstore.store-io-pool-size",
            ParameterNote {
                details_note: "Async IO is enabled by default".to_string(),
                condition: None,
            },
        );

        let results = fixture.run();

        assert!(results[0].details.ends_with("Async IO is enabled by default"));
    }

    proptest::proptest! {
        #[test]
        fn prop_classification_matrix(cur in 0_i64..4, src in 0_i64..4, tgt in 0_i64..4) {
            let (c, s, t) = (Value::Int(cur), Value::Int(src), Value::Int(tgt));
            let expected = if cur == src {
                (src != tgt).then_some(Classification::DefaultChanged)
            } else {
                (cur != tgt).then_some(Classification::CustomDiverges)
            };
            proptest::prop_assert_eq!(classify(Some(&c), Some(&s), Some(&t)), expected);
        }
    }
}
