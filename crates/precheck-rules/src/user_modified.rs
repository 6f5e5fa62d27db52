//! Detection of parameters changed from the source release's defaults

use crate::context::RuleContext;
use crate::diff::{differing_pairs, field_key, is_map_parameter};
use crate::requirements::DataRequirements;
use crate::rule::{Rule, RuleError};
use precheck_model::{format_value, values_equal, CheckResult, ComponentType, Value};

/// Rule identifier
pub const USER_MODIFIED_PARAMS: &str = "USER_MODIFIED_PARAMS";

/// Finding category
pub const USER_MODIFIED_CATEGORY: &str = "user_modified";

const SUGGESTIONS: [&str; 3] = [
    "This parameter has been modified from the source version default",
    "Review if this modification is intentional and appropriate",
    "Ensure the modified value is compatible with target version",
];

/// Reports every parameter whose current value differs from its source default
#[derive(Debug, Clone, Copy, Default)]
pub struct UserModifiedRule;

impl UserModifiedRule {
    /// Create rule
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn modified(
        component: ComponentType,
        key: &str,
        current: &Value,
        source: &Value,
    ) -> Vec<CheckResult> {
        let (current, source) = (Some(current), Some(source));
        if is_map_parameter(&[current, source]) {
            return differing_pairs(current, source)
                .into_iter()
                .map(|field| {
                    let key = field_key(key, &field.path);
                    finding(component, &key, field.current, field.source)
                })
                .collect();
        }
        if values_equal(current, source) {
            return Vec::new();
        }
        vec![finding(component, key, current, source)]
    }
}

fn finding(
    component: ComponentType,
    key: &str,
    current: Option<&Value>,
    source: Option<&Value>,
) -> CheckResult {
    let mut result = CheckResult::new(USER_MODIFIED_PARAMS, USER_MODIFIED_CATEGORY, String::new())
        .for_parameter(component, key)
        .with_details(format!(
            "Current: {} | Source Default: {}",
            format_value(current),
            format_value(source)
        ))
        .with_values(current, source, None)
        .with_suggestions(SUGGESTIONS.iter().map(ToString::to_string).collect());
    result.message = format!(
        "Parameter {} in {component} has been modified by user \
         (differs from source version default)",
        result.parameter_name
    );
    result
}

impl Rule for UserModifiedRule {
    fn name(&self) -> &'static str {
        USER_MODIFIED_PARAMS
    }

    fn description(&self) -> &'static str {
        "Detect parameters that have been modified by the user from source version defaults"
    }

    fn category(&self) -> &'static str {
        USER_MODIFIED_CATEGORY
    }

    fn data_requirements(&self) -> DataRequirements {
        DataRequirements::all_components()
            .with_config()
            .with_system_variables()
            .with_source_defaults()
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError> {
        let mut results = Vec::new();
        for component in ctx.components() {
            let Some(catalog) = ctx.source_catalog(component) else {
                continue;
            };
            for (key, default) in catalog {
                let Some(current) = ctx.current_value(component, key) else {
                    continue;
                };
                match default.value() {
                    Some(source) => results.extend(Self::modified(component, key, current, source)),
                    None => {
                        let mut result = CheckResult::new(
                            USER_MODIFIED_PARAMS,
                            USER_MODIFIED_CATEGORY,
                            String::new(),
                        )
                        .for_parameter(component, key)
                        .with_details(
                            "Source version default is unknown; \
                             cannot determine whether the value was modified",
                        )
                        .with_values(Some(current), None, None)
                        .with_metadata("undetermined", true);
                        result.message = format!(
                            "Parameter {} in {component}: cannot determine whether it was modified",
                            result.parameter_name
                        );
                        results.push(result);
                    }
                }
            }
        }
        tracing::debug!(findings = results.len(), "user-modified rule evaluated");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Catalog, Catalogs, InstanceGroups};
    use precheck_model::{
        ClusterSnapshot, ComponentState, ParamKind, ParameterValue, UpgradePath, ValueType,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn evaluate(state: ComponentState, catalog: Catalog) -> Vec<CheckResult> {
        let snapshot = ClusterSnapshot::new("v7.5.0", "v8.5.0").with_instance("tidb", state);
        let ctx = RuleContext::new(&snapshot, UpgradePath::new("v7.5.0", "v8.5.0"))
            .with_instances(InstanceGroups::from([(ComponentType::Tidb, vec!["tidb".to_string()])]))
            .with_defaults(Catalogs::from([(ComponentType::Tidb, catalog)]), Catalogs::new());
        UserModifiedRule::new().evaluate(&ctx).unwrap()
    }

    #[test]
    fn reports_modified_scalar() {
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0")
            .with_config("performance.max-procs", ParameterValue::new(8_i64))
            .with_variable("tidb_mem_quota_query", ParameterValue::new("1073741824"));
        let catalog = Catalog::from([
            ("performance.max-procs".to_string(), ParameterValue::new(0_i64)),
            ("sysvar:tidb_mem_quota_query".to_string(), ParameterValue::new(1_073_741_824_i64)),
        ]);

        let results = evaluate(state, catalog);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].parameter_name, "performance.max-procs");
        assert_eq!(results[0].param_type, ParamKind::Config);
        assert_eq!(results[0].current_value, Some(Value::Int(8)));
        assert_eq!(results[0].source_default, Some(Value::Int(0)));
        assert_eq!(results[0].suggestions.len(), 3);
        assert!(results[0].message.contains("modified by user"));
    }

    #[test]
    fn map_parameters_reported_per_field() {
        let current = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(5)),
        ]));
        let source = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ]));
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0")
            .with_config("labels", ParameterValue::typed(current, ValueType::Map));
        let catalog =
            Catalog::from([("labels".to_string(), ParameterValue::typed(source, ValueType::Map))]);

        let results = evaluate(state, catalog);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].parameter_name, "labels.b");
        assert_eq!(results[0].current_value, Some(Value::Int(5)));
    }

    #[test]
    fn unknown_default_is_undetermined_and_absent_current_skipped() {
        let state = ComponentState::new(ComponentType::Tidb, "v7.5.0")
            .with_config("oom-action", ParameterValue::new("cancel"));
        let catalog = Catalog::from([
            ("oom-action".to_string(), ParameterValue::unset(ValueType::String)),
            ("not-collected".to_string(), ParameterValue::new(1_i64)),
        ]);

        let results = evaluate(state, catalog);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].parameter_name, "oom-action");
        assert_eq!(results[0].metadata.get("undetermined"), Some(&serde_json::Value::Bool(true)));
    }
}
