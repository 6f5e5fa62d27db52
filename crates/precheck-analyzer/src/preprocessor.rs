//! Noise removal before rule evaluation
//!
//! Walks the unreduced default catalogs of every component kind that has
//! instances and decides, per parameter and per instance value, whether it
//! reaches the rules. A parameter is kept when any instance keeps it. Each
//! removed parameter yields one informational `filtered` finding so nothing
//! disappears silently.
//!
//! # Decision order
//!
//! 1. In-range forced change: always kept
//! 2. Filter policy match: removed
//! 3. New parameter (target only) whose current value equals the target
//!    default: removed, unless the component is exempt
//! 4. Current, source and target all equal: removed
//! 5. Resource-dependent, source equals target, current differs: removed
//! 6. Otherwise kept

use precheck_model::{
    format_value, split_key, values_equal, CheckResult, ComponentType, ParameterValue, Value,
    META_FILTERED,
};
use precheck_rules::{Catalog, Catalogs, FilterPolicy, FilterReason, RuleContext};

/// Rule identifier on filtered findings
pub const PARAMETER_PREPROCESSOR: &str = "PARAMETER_PREPROCESSOR";

/// Category of filtered findings
pub const FILTERED_CATEGORY: &str = "filtered";

/// Component kinds that report every new parameter
///
/// PD surfaces new parameters even when the current value already equals the
/// target default. Pending product-owner confirmation.
pub const NEW_PARAMETER_EXEMPT: &[ComponentType] = &[ComponentType::Pd];

/// Why a parameter was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched the filter policy
    Policy(FilterReason),
    /// Current, source and target identical
    Identical,
    /// Hardware auto-tuned drift
    AutoTuned,
    /// New parameter already at its target default
    NewMatchesTarget,
}

impl SkipReason {
    /// Reason text recorded as `filter_reason`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Policy(reason) => reason.as_str(),
            Self::Identical => "all values identical (no difference)",
            Self::AutoTuned => "resource-dependent parameter (auto-tuned, source == target)",
            Self::NewMatchesTarget => {
                "new parameter (current value equals target default, no action needed)"
            }
        }
    }

    fn note(self) -> &'static str {
        match self {
            Self::Policy(_) => {
                "This parameter varies by deployment environment and does not require user \
                 action during upgrade."
            }
            Self::Identical => {
                "All values (current, source default, target default) are identical. \
                 No action needed."
            }
            Self::AutoTuned => {
                "This parameter is automatically adjusted by the system based on available \
                 resources (CPU cores, memory, etc.)."
            }
            Self::NewMatchesTarget => {
                "The current value already equals the new default. No action needed."
            }
        }
    }
}

/// Output of preprocessing
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// Reduced source catalogs
    pub source: Catalogs,
    /// Reduced target catalogs
    pub target: Catalogs,
    /// One `filtered` finding per removed parameter
    pub findings: Vec<CheckResult>,
}

/// Values and flags the decision looks at
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'v> {
    /// Owning component kind
    pub component: ComponentType,
    /// Display name (no `sysvar:` prefix)
    pub name: &'v str,
    /// Observed value
    pub current: Option<&'v Value>,
    /// Source default
    pub source: Option<&'v Value>,
    /// Target default
    pub target: Option<&'v Value>,
    /// Named by an in-range forced change
    pub forced: bool,
    /// Only the target release defines it
    pub is_new: bool,
}

/// Removes parameters that should not reach rules
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    /// Create preprocessor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decide whether a parameter is removed
    #[must_use]
    pub fn decide(candidate: &Candidate<'_>) -> Option<SkipReason> {
        let Candidate {
            component,
            name,
            current,
            source,
            target,
            forced,
            is_new,
        } = *candidate;

        if forced {
            return None;
        }
        if let Some(reason) = FilterPolicy::should_filter(name) {
            return Some(SkipReason::Policy(reason));
        }
        if is_new {
            let at_target = current.is_some() && values_equal(current, target);
            return (at_target && !NEW_PARAMETER_EXEMPT.contains(&component))
                .then_some(SkipReason::NewMatchesTarget);
        }
        if values_equal(current, source) && values_equal(source, target) {
            return Some(SkipReason::Identical);
        }
        if FilterPolicy::is_resource_dependent(name)
            && values_equal(source, target)
            && !values_equal(current, source)
        {
            return Some(SkipReason::AutoTuned);
        }
        None
    }

    /// Reduce the context's unreduced catalogs
    #[must_use]
    pub fn run(&self, ctx: &RuleContext<'_>) -> Preprocessed {
        let mut out = Preprocessed::default();
        let empty = Catalog::new();

        for component in ctx.components() {
            let raw_source = ctx.raw_source_catalog(component).unwrap_or(&empty);
            let raw_target = ctx.raw_target_catalog(component).unwrap_or(&empty);
            let mut source = Catalog::new();
            let mut target = Catalog::new();
            let before = out.findings.len();

            let keys = raw_source.keys().map(|key| (key, false)).chain(
                raw_target
                    .keys()
                    .filter(|key| !raw_source.contains_key(*key))
                    .map(|key| (key, true)),
            );
            for (key, is_new) in keys {
                let source_value = raw_source.get(key);
                let target_value = raw_target.get(key);
                let per_value =
                    candidates(ctx, component, key, is_new, [source_value, target_value]);
                // Kept when any instance keeps it
                let skipped: Option<Vec<SkipReason>> =
                    per_value.iter().map(Self::decide).collect();

                match skipped.as_deref() {
                    Some([reason, ..]) => {
                        out.findings.push(filtered(key, &per_value[0], *reason));
                    }
                    _ => {
                        if let Some(value) = source_value {
                            source.insert(key.clone(), value.clone());
                        }
                        if let Some(value) = target_value {
                            target.insert(key.clone(), value.clone());
                        }
                    }
                }
            }

            tracing::debug!(
                "Preprocessed {}: kept {} source / {} target parameters, filtered {}",
                component,
                source.len(),
                target.len(),
                out.findings.len() - before
            );
            out.source.insert(component, source);
            out.target.insert(component, target);
        }
        out
    }
}

/// One candidate per distinct current value across the component's instances
fn candidates<'v>(
    ctx: &'v RuleContext<'_>,
    component: ComponentType,
    key: &'v str,
    is_new: bool,
    defaults: [Option<&'v ParameterValue>; 2],
) -> Vec<Candidate<'v>> {
    let [source, target] = defaults.map(|value| value.and_then(ParameterValue::value));
    let forced = ctx.is_forced(component, key);
    let candidate = |current: Option<&'v Value>| Candidate {
        component,
        name: split_key(key).1,
        current,
        source,
        target,
        forced,
        is_new,
    };
    let groups = ctx.value_groups(component, key);
    if groups.is_empty() {
        return vec![candidate(None)];
    }
    groups.into_iter().map(|group| candidate(group.value)).collect()
}

fn filtered(key: &str, candidate: &Candidate<'_>, reason: SkipReason) -> CheckResult {
    let mut details = format!(
        "This parameter has been filtered from detailed analysis.\nReason: {}",
        reason.as_str()
    );
    for (label, value) in [
        ("Current Value", candidate.current),
        ("Source Default", candidate.source),
        ("Target Default", candidate.target),
    ] {
        if value.is_some() {
            details.push_str(&format!("\n{label}: {}", format_value(value)));
        }
    }
    details.push_str("\n\nNote: ");
    details.push_str(reason.note());

    let prefix = if candidate.is_new { "New parameter" } else { "Parameter" };
    CheckResult::new(
        PARAMETER_PREPROCESSOR,
        FILTERED_CATEGORY,
        format!("{prefix} {} in {}: {}", candidate.name, candidate.component, reason.as_str()),
    )
    .for_parameter(candidate.component, key)
    .with_details(details)
    .with_values(candidate.current, candidate.source, candidate.target)
    .with_metadata(META_FILTERED, true)
    .with_metadata("filter_reason", reason.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_model::{
        ClusterSnapshot, ComponentState, ForcedChange, ForcedChangeCatalog, ParamKind,
        ParameterValue, UpgradePath, UpgradeStep,
    };
    use precheck_rules::InstanceGroups;
    use pretty_assertions::assert_eq;

    fn candidate<'v>(name: &'v str, values: [Option<&'v Value>; 3]) -> Candidate<'v> {
        Candidate {
            component: ComponentType::Tikv,
            name,
            current: values[0],
            source: values[1],
            target: values[2],
            forced: false,
            is_new: false,
        }
    }

    #[test]
    fn decision_order() {
        let (a, b) = (Value::Int(4), Value::Int(8));

        let dir = candidate("data-dir", [Some(&a), Some(&b), Some(&b)]);
        assert_eq!(
            Preprocessor::decide(&dir),
            Some(SkipReason::Policy(FilterReason::ExactMatch))
        );
        assert_eq!(Preprocessor::decide(&Candidate { forced: true, ..dir }), None);

        let same = candidate("raftstore.apply-pool-size", [Some(&a), Some(&a), Some(&a)]);
        assert_eq!(Preprocessor::decide(&same), Some(SkipReason::Identical));

        let tuned = candidate("server.grpc-concurrency", [Some(&b), Some(&a), Some(&a)]);
        assert_eq!(Preprocessor::decide(&tuned), Some(SkipReason::AutoTuned));

        let drift = candidate("raftstore.apply-pool-size", [Some(&a), Some(&a), Some(&b)]);
        assert_eq!(Preprocessor::decide(&drift), None);
    }

    #[test]
    fn new_parameters_and_pd_exemption() {
        let v = Value::Int(1);
        let new = Candidate {
            is_new: true,
            ..candidate("raftstore.new-knob", [Some(&v), None, Some(&v)])
        };
        assert_eq!(Preprocessor::decide(&new), Some(SkipReason::NewMatchesTarget));
        assert_eq!(
            Preprocessor::decide(&Candidate {
                component: ComponentType::Pd,
                ..new
            }),
            None
        );
        assert_eq!(Preprocessor::decide(&Candidate { current: None, ..new }), None);
    }

    #[test]
    fn parameter_kept_when_any_instance_diverges() {
        let tikv = |pool: i64| {
            ComponentState::new(ComponentType::Tikv, "v7.5.0")
                .with_config("raftstore.apply-pool-size", ParameterValue::new(pool))
        };
        let snapshot = ClusterSnapshot::new("v7.5.0", "v8.5.0")
            .with_instance("tikv-a", tikv(5))
            .with_instance("tikv-b", tikv(7));
        let catalog = Catalog::from([(
            "raftstore.apply-pool-size".to_string(),
            ParameterValue::new(5_i64),
        )]);
        let names = vec!["tikv-a".to_string(), "tikv-b".to_string()];
        let ctx = RuleContext::new(&snapshot, UpgradePath::new("v7.5.0", "v8.5.0"))
            .with_instances(InstanceGroups::from([(ComponentType::Tikv, names)]))
            .with_raw_defaults(
                Catalogs::from([(ComponentType::Tikv, catalog.clone())]),
                Catalogs::from([(ComponentType::Tikv, catalog)]),
            );

        let out = Preprocessor::new().run(&ctx);

        assert!(out.findings.is_empty());
        assert!(out.source[&ComponentType::Tikv].contains_key("raftstore.apply-pool-size"));
        assert!(out.target[&ComponentType::Tikv].contains_key("raftstore.apply-pool-size"));
    }

    #[test]
    fn run_reduces_catalogs_and_reports() {
        let snapshot = ClusterSnapshot::new("v7.5.0", "v8.5.0").with_instance(
            "tidb",
            ComponentState::new(ComponentType::Tidb, "v7.5.0")
                .with_config("host", ParameterValue::new("0.0.0.0"))
                .with_config("token-limit", ParameterValue::new(1000_i64))
                .with_config("oom-action", ParameterValue::new("cancel"))
                .with_variable("tidb_enable_paging", ParameterValue::new("ON")),
        );
        let catalog = |paging: &str| {
            Catalog::from([
                ("host".to_string(), ParameterValue::new("0.0.0.0")),
                ("token-limit".to_string(), ParameterValue::new(1000_i64)),
                ("oom-action".to_string(), ParameterValue::new("cancel")),
                ("sysvar:tidb_enable_paging".to_string(), ParameterValue::new(paging)),
            ])
        };
        let forced = ForcedChangeCatalog::new().with_step(
            ComponentType::Tidb,
            UpgradeStep::new(
                "v8.0.0",
                vec![ForcedChange::new(ParamKind::Config, "oom-action", "log")],
            ),
        );
        let ctx = RuleContext::new(&snapshot, UpgradePath::new("v7.5.0", "v8.5.0"))
            .with_instances(InstanceGroups::from([(ComponentType::Tidb, vec!["tidb".to_string()])]))
            .with_raw_defaults(
                Catalogs::from([(ComponentType::Tidb, catalog("ON"))]),
                Catalogs::from([(ComponentType::Tidb, catalog("OFF"))]),
            )
            .with_forced_changes(&forced);

        let out = Preprocessor::new().run(&ctx);

        let kept: Vec<&String> = out.source[&ComponentType::Tidb].keys().collect();
        assert_eq!(kept, ["oom-action", "sysvar:tidb_enable_paging"]);
        assert_eq!(out.target[&ComponentType::Tidb].len(), 2);

        let filtered: Vec<(&str, &str)> = out
            .findings
            .iter()
            .map(|f| {
                let reason = f.metadata["filter_reason"].as_str().unwrap_or("");
                (f.parameter_name.as_str(), reason)
            })
            .collect();
        assert_eq!(
            filtered,
            [
                ("host", "deployment-specific parameter (exact match)"),
                ("token-limit", "all values identical (no difference)"),
            ]
        );
        assert!(out.findings.iter().all(CheckResult::is_filtered));
    }
}
