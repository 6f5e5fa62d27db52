//! Analyzer orchestrator
//!
//! Runs one analysis end to end:
//! - Collects the data requirements of the active rules
//! - Slices the source and target knowledge bases
//! - Groups snapshot instances by component kind
//! - Removes noise with the [`Preprocessor`]
//! - Evaluates every rule against one shared context
//! - Aggregates findings into an [`AnalysisResult`]

use crate::catalog;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::preprocessor::{Preprocessed, Preprocessor};
use crate::result::{
    AnalysisResult, FocusParam, ParameterIndex, META_RULE_FAILED, RULE_ERROR_CATEGORY,
};
use crate::topology::{group_instances, InstanceResolver, PrefixResolver};
use chrono::{DateTime, Utc};
use precheck_model::{
    split_key, values_equal, CheckResult, ClusterSnapshot, ForcedChangeCatalog, KnowledgeBase,
    ParameterNotes, RiskLevel, Severity, UpgradePath,
};
use precheck_rules::{Catalogs, DriftBehavior, ParamState, Rule, RuleContext, RuleError, RuleSet};

/// Inputs of one analysis, all borrowed and read-only
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisInput<'a> {
    /// Observed cluster state
    pub snapshot: Option<&'a ClusterSnapshot>,
    /// Defaults of the running release
    pub source_kb: Option<&'a KnowledgeBase>,
    /// Defaults of the release being upgraded to
    pub target_kb: Option<&'a KnowledgeBase>,
    /// Values the upgrade overwrites
    pub forced_changes: Option<&'a ForcedChangeCatalog>,
    /// Extra explanations for drifting parameters
    pub notes: Option<&'a ParameterNotes>,
}

impl<'a> AnalysisInput<'a> {
    /// Create input for a snapshot
    #[inline]
    #[must_use]
    pub fn new(snapshot: &'a ClusterSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// Set both knowledge bases
    #[inline]
    #[must_use]
    pub fn with_knowledge(mut self, source: &'a KnowledgeBase, target: &'a KnowledgeBase) -> Self {
        self.source_kb = Some(source);
        self.target_kb = Some(target);
        self
    }

    /// Set forced-change catalog
    #[inline]
    #[must_use]
    pub fn with_forced_changes(mut self, catalog: &'a ForcedChangeCatalog) -> Self {
        self.forced_changes = Some(catalog);
        self
    }

    /// Set parameter notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: &'a ParameterNotes) -> Self {
        self.notes = Some(notes);
        self
    }
}

/// Upgrade risk analyzer
///
/// Holds no per-analysis state; one analyzer can serve any number of
/// [`Analyzer::analyze`] calls, concurrently if needed.
#[derive(Debug)]
pub struct Analyzer {
    rules: RuleSet,
    config: AnalyzerConfig,
    resolver: Box<dyn InstanceResolver>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Create analyzer with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(AnalyzerConfig::default())
    }

    /// Create analyzer from configuration
    #[must_use]
    pub fn from_config(config: AnalyzerConfig) -> Self {
        Self {
            rules: config.rule_set(),
            config,
            resolver: Box::new(PrefixResolver),
        }
    }

    /// Replace the rule set
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the instance resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl InstanceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Active rules
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an upgrade
    ///
    /// # Workflow
    /// 1. Collect data requirements of the active rules
    /// 2. Resolve the upgrade path and slice both knowledge bases
    /// 3. Group instances by component kind
    /// 4. Preprocess, then evaluate every rule
    /// 5. Aggregate findings
    ///
    /// # Errors
    /// Returns [`AnalyzeError::NoSnapshot`] when the input has no snapshot.
    /// Failing rules never abort the analysis; each becomes an error finding.
    pub fn analyze(&self, input: &AnalysisInput<'_>) -> Result<AnalysisResult, AnalyzeError> {
        let snapshot = input.snapshot.ok_or(AnalyzeError::NoSnapshot)?;
        let span = tracing::info_span!(
            "analyze",
            source = %snapshot.source_version,
            target = %snapshot.target_version
        );
        let _entered = span.enter();
        tracing::info!(
            "Analyzing upgrade {} -> {}: {} instances, {} rules",
            snapshot.source_version,
            snapshot.target_version,
            snapshot.len(),
            self.rules.len()
        );

        // 1. Requirements, widened to the focus components
        let mut requirements = self.rules.requirements();
        requirements
            .components
            .extend(self.config.focus_params.keys().copied());

        // 2. Upgrade path and knowledge-base slices
        let path = UpgradePath::new(&snapshot.source_version, &snapshot.target_version)
            .with_bootstrap(
                input.source_kb.and_then(KnowledgeBase::bootstrap_version),
                input.target_kb.and_then(KnowledgeBase::bootstrap_version),
            );
        if path.source.is_none() || path.target.is_none() {
            tracing::warn!(
                "Cannot parse release versions {} / {}; version-bounded checks are skipped",
                snapshot.source_version,
                snapshot.target_version
            );
        }
        let source = if requirements.need_source_defaults {
            catalog::slice(input.source_kb, &requirements, "source")
        } else {
            Catalogs::new()
        };
        let target = if requirements.need_target_defaults {
            catalog::slice(input.target_kb, &requirements, "target")
        } else {
            Catalogs::new()
        };

        // 3. Instances
        let instances = group_instances(
            snapshot,
            self.resolver.as_ref(),
            &requirements.components,
            requirements.need_all_instances,
        );

        let no_forced_changes = ForcedChangeCatalog::new();
        let mut ctx = RuleContext::new(snapshot, path)
            .with_instances(instances)
            .with_raw_defaults(source, target);
        if requirements.need_forced_changes {
            ctx = ctx.with_forced_changes(input.forced_changes.unwrap_or(&no_forced_changes));
        }
        if let Some(notes) = input.notes {
            ctx = ctx.with_notes(notes);
        }

        // 4. Preprocess and evaluate
        let Preprocessed {
            source,
            target,
            findings: mut check_results,
        } = Preprocessor::new().run(&ctx);
        let filtered = check_results.len();
        let ctx = ctx.with_defaults(source, target);
        for found in self.run_rules(&ctx) {
            check_results.extend(found);
        }

        // 5. Aggregate
        let result = AnalysisResult::from_findings(
            snapshot.source_version.clone(),
            snapshot.target_version.clone(),
            check_results,
        )
        .with_focus_params(self.focus_params(&ctx));

        let summary = result.summary();
        tracing::info!(
            "Analysis completed: {} findings ({} filtered, {} high risk, {} rule errors)",
            summary.total,
            filtered,
            summary.high_risk,
            summary.rule_errors
        );
        Ok(result)
    }

    /// Analyze and stamp the result with the given time
    ///
    /// # Errors
    /// Same as [`Analyzer::analyze`].
    pub fn analyze_at(
        &self,
        input: &AnalysisInput<'_>,
        at: DateTime<Utc>,
    ) -> Result<AnalysisResult, AnalyzeError> {
        self.analyze(input).map(|result| result.with_generated_at(at))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_rules(&self, ctx: &RuleContext<'_>) -> Vec<Vec<CheckResult>> {
        self.rules.iter().map(|rule| evaluate(rule, ctx)).collect()
    }

    #[cfg(feature = "parallel")]
    fn run_rules(&self, ctx: &RuleContext<'_>) -> Vec<Vec<CheckResult>> {
        use rayon::prelude::*;

        let rules: Vec<&dyn Rule> = self.rules.iter().collect();
        rules.par_iter().map(|rule| evaluate(*rule, ctx)).collect()
    }

    fn focus_params(&self, ctx: &RuleContext<'_>) -> ParameterIndex<FocusParam> {
        let mut index = ParameterIndex::new();
        for (component, key) in self.config.focus_keys() {
            let current = ctx.current_value(component, key);
            let source_default = ctx.raw_source_default(component, key);
            let target_default = ctx.raw_target_default(component, key);
            let param_type = split_key(key).0;

            let will_change = match ctx.forced_change_for(component, key, current) {
                Some(change) => !values_equal(change.forced_value.as_ref(), current),
                None => {
                    DriftBehavior::for_parameter(component, param_type).applies_new_defaults()
                        && current.is_some()
                        && ParamState::of(current, source_default) == ParamState::UseDefault
                        && !values_equal(source_default, target_default)
                }
            };

            index.entry(component).or_default().insert(
                key.to_string(),
                FocusParam {
                    param_type,
                    current_value: current.cloned(),
                    source_default: source_default.cloned(),
                    target_default: target_default.cloned(),
                    is_modified: ctx.is_user_modified(component, key),
                    will_change,
                },
            );
        }
        index
    }
}

fn evaluate(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Vec<CheckResult> {
    let span = tracing::debug_span!("rule", name = rule.name());
    let _entered = span.enter();
    match rule.evaluate(ctx) {
        Ok(found) => {
            tracing::debug!("Rule {} produced {} findings", rule.name(), found.len());
            found
        }
        Err(e) => {
            tracing::error!("Rule {} failed: {}", rule.name(), e);
            vec![rule_failure(rule, &e)]
        }
    }
}

fn rule_failure(rule: &dyn Rule, error: &RuleError) -> CheckResult {
    CheckResult::new(
        rule.name(),
        RULE_ERROR_CATEGORY,
        format!("Rule {} failed: {error}", rule.name()),
    )
    .with_level(Severity::Error, RiskLevel::High)
    .with_details(format!("{}\nError: {error}", rule.description()))
    .with_suggestion("Findings of this rule are missing; check the input data and rerun")
    .with_metadata(META_RULE_FAILED, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_model::{ComponentState, ComponentType, ParameterValue};
    use precheck_rules::DataRequirements;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Broken;

    impl Rule for Broken {
        fn name(&self) -> &'static str {
            "BROKEN"
        }

        fn description(&self) -> &'static str {
            "Always fails"
        }

        fn category(&self) -> &'static str {
            "broken"
        }

        fn data_requirements(&self) -> DataRequirements {
            DataRequirements::all_components().with_config()
        }

        fn evaluate(&self, _ctx: &RuleContext<'_>) -> Result<Vec<CheckResult>, RuleError> {
            Err(RuleError::invalid("BROKEN", "unusable input"))
        }
    }

    fn snapshot() -> ClusterSnapshot {
        ClusterSnapshot::new("v7.5.0", "v8.5.0").with_instance(
            "tidb-0",
            ComponentState::new(ComponentType::Tidb, "v7.5.0")
                .with_config("token-limit", ParameterValue::new(1000_i64)),
        )
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let err = Analyzer::new().analyze(&AnalysisInput::default()).unwrap_err();
        assert!(err.is_missing_input());
    }

    #[test]
    fn failing_rule_becomes_finding_and_others_still_run() {
        let snapshot = snapshot();
        let mut rules = RuleSet::with_defaults();
        rules.register(Broken);
        let analyzer = Analyzer::new().with_rules(rules);

        let result = analyzer.analyze(&AnalysisInput::new(&snapshot)).unwrap();

        let failures: Vec<&CheckResult> = result.findings_in(RULE_ERROR_CATEGORY).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].rule_id, "BROKEN");
        assert_eq!(failures[0].severity, Severity::Error);
        assert_eq!(failures[0].metadata[META_RULE_FAILED], serde_json::json!(true));
        assert_eq!(result.summary().rule_errors, 1);
    }

    #[test]
    fn analyze_at_stamps_time_only_there() {
        let snapshot = snapshot();
        let analyzer = Analyzer::new();
        let input = AnalysisInput::new(&snapshot);

        let plain = analyzer.analyze(&input).unwrap();
        assert_eq!(plain.generated_at, None);

        let at = Utc::now();
        let stamped = analyzer.analyze_at(&input, at).unwrap();
        assert_eq!(stamped.generated_at, Some(at));
        assert_eq!(stamped.check_results, plain.check_results);
    }
}
