//! Cross-node consistency
//!
//! Compares the configuration of every instance of a component kind and
//! reports parameters that are missing on some instances or whose values
//! differ. One finding per parameter lists every instance's value.

use crate::context::RuleContext;
use crate::filter::FilterPolicy;
use crate::requirements::DataRequirements;
use crate::rule::{Rule, RuleError};
use precheck_model::{
    format_value, values_equal, CheckResult, ComponentState, ComponentType, RiskLevel, Severity,
    Value,
};
use std::collections::BTreeSet;
use std::path::Path;

/// Rule identifier
pub const CONSISTENCY: &str = "CONSISTENCY";

/// Finding category
pub const CONSISTENCY_CATEGORY: &str = "consistency";

const HIGH_RISK: &[&str] = &[
    "storage.reserve-space",
    "raftstore.raft-entry-max-size",
    "rocksdb.defaultcf.block-cache-size",
    "schedule.max-store-down-time",
    "schedule.leader-schedule-limit",
    "schedule.region-schedule-limit",
];

const MEDIUM_RISK: &[&str] = &[
    "raftstore.apply-pool-size",
    "raftstore.store-pool-size",
    "server.grpc-concurrency",
    "readpool.storage.high-concurrency",
    "readpool.storage.normal-concurrency",
    "readpool.storage.low-concurrency",
    "schedule.replica-schedule-limit",
    "replication.max-replicas",
];

/// Risk of two nodes disagreeing on a parameter
#[must_use]
pub fn divergence_risk(name: &str) -> RiskLevel {
    if HIGH_RISK.contains(&name) {
        RiskLevel::High
    } else if MEDIUM_RISK.contains(&name) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

struct Observation<'s> {
    instance: &'s str,
    address: &'s str,
    value: Option<&'s Value>,
}

/// Flags parameters that differ between instances of the same component kind
#[derive(Debug, Clone)]
pub struct ConsistencyRule {
    components: BTreeSet<ComponentType>,
}

impl Default for ConsistencyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsistencyRule {
    /// Create rule inspecting every component kind
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: ComponentType::ALL.into_iter().collect(),
        }
    }

    /// Restrict to the given component kinds
    #[must_use]
    pub fn with_components(mut self, components: impl IntoIterator<Item = ComponentType>) -> Self {
        self.components = components.into_iter().collect();
        self
    }

    /// Inspected component kinds
    #[inline]
    #[must_use]
    pub fn components(&self) -> &BTreeSet<ComponentType> {
        &self.components
    }

    fn check_component(
        component: ComponentType,
        instances: &[(&str, &ComponentState)],
    ) -> Vec<CheckResult> {
        let names: BTreeSet<&str> = instances
            .iter()
            .flat_map(|(_, state)| state.config.keys().map(String::as_str))
            .collect();

        let mut results = Vec::new();
        for name in names {
            let filename_only = FilterPolicy::is_filename_only(name);
            if !filename_only && FilterPolicy::should_filter(name).is_some() {
                continue;
            }
            let observations: Vec<Observation<'_>> = instances
                .iter()
                .map(|&(instance, state)| Observation {
                    instance,
                    address: state.address().unwrap_or(instance),
                    value: state.current_value(name),
                })
                .collect();

            let missing = observations.iter().filter(|o| o.value.is_none()).count();
            let present: Vec<&Value> = observations.iter().filter_map(|o| o.value).collect();
            let same = |a: &Value, b: &Value| {
                if filename_only {
                    file_name(a) == file_name(b)
                } else {
                    values_equal(Some(a), Some(b))
                }
            };
            // Pairwise: the comparator is not transitive across representations
            let consistent = present
                .iter()
                .enumerate()
                .all(|(i, a)| present[i + 1..].iter().all(|b| same(a, b)));
            if missing == 0 && consistent {
                continue;
            }
            results.push(Self::finding(component, name, &observations, missing));
        }
        results
    }

    fn finding(
        component: ComponentType,
        name: &str,
        observations: &[Observation<'_>],
        missing: usize,
    ) -> CheckResult {
        let total = observations.len();
        let (risk, message, suggestion) = if missing > 0 {
            (
                RiskLevel::Medium,
                format!(
                    "Parameter {name} is not configured on all {component} nodes \
                     (missing on {missing} of {total})"
                ),
                "Ensure the parameter is configured on every node",
            )
        } else {
            (
                divergence_risk(name),
                format!("Parameter {name} differs across {total} {component} nodes"),
                "Review if this difference is intentional",
            )
        };
        let severity = match risk {
            RiskLevel::Low => Severity::Info,
            RiskLevel::Medium | RiskLevel::High => Severity::Warning,
        };

        let details = observations
            .iter()
            .map(|o| format!("{} ({}): {}", o.instance, o.address, format_value(o.value)))
            .collect::<Vec<_>>()
            .join("\n");
        let instances: Vec<serde_json::Value> = observations
            .iter()
            .map(|o| {
                serde_json::json!({
                    "instance": o.instance,
                    "address": o.address,
                    "value": o.value.map_or(serde_json::Value::Null, Value::to_json),
                })
            })
            .collect();

        let mut result = CheckResult::new(CONSISTENCY, CONSISTENCY_CATEGORY, message)
            .for_parameter(component, name)
            .with_level(severity, risk)
            .with_details(details)
            .with_suggestion(suggestion)
            .with_suggestion(format!(
                "Ensure all {component} nodes have consistent parameters for scale out"
            ))
            .with_metadata("instances", instances);
        result.current_value = observations.iter().find_map(|o| o.value.cloned());
        result
    }
}

fn file_name(value: &Value) -> Option<&str> {
    value
        .as_str()
        .and_then(|text| Path::new(text).file_name())
        .and_then(|name| name.to_str())
}

impl Rule for ConsistencyRule {
    fn name(&self) -> &'static str {
        CONSISTENCY
    }

    fn description(&self) -> &'static str {
        "Compare parameters across all instances of a component for consistency"
    }

    fn category(&self) -> &'static str {
        CONSISTENCY_CATEGORY
    }

    fn data_requirements(&self) -> DataRequirements {
        DataRequirements::for_components(self.components.iter().copied())
            .with_config()
            .with_all_instances()
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError> {
        let mut results = Vec::new();
        for component in ctx.components().filter(|c| self.components.contains(c)) {
            let instances = ctx.instances(component);
            if instances.len() < 2 {
                continue;
            }
            let found = Self::check_component(component, &instances);
            tracing::debug!(
                %component,
                instances = instances.len(),
                findings = found.len(),
                "consistency checked"
            );
            results.extend(found);
        }
        Ok(results)
    }
}
