use precheck_analyzer::prelude::*;
use precheck_model::{ComponentState, ForcedChange, ParamKind, Value};
use precheck_rules::ParamState;
use precheck_test_utils::{
    create_defaults, create_forced_catalog, create_instance, SOURCE_VERSION, TARGET_VERSION,
};
use proptest::prelude::*;
use serde_json::json;

fn knowledge(
    component: ComponentType,
    params: &[(&str, serde_json::Value)],
    version: &str,
) -> KnowledgeBase {
    KnowledgeBase::new().with_component(component, create_defaults(version, params))
}

fn parameter() -> impl Strategy<Value = (ComponentType, &'static str)> {
    prop_oneof![
        Just((ComponentType::Tidb, "performance.stmt-count-limit")),
        Just((ComponentType::Tidb, "sysvar:tidb_opt_agg_push_down")),
        Just((ComponentType::Pd, "schedule.merge-schedule-limit")),
        Just((ComponentType::Tikv, "raftstore.apply-pool-size")),
        Just((ComponentType::Tiflash, "profiles.default.max_memory_usage")),
    ]
}

proptest! {
    #[test]
    fn prop_analyze_is_idempotent(
        values in proptest::collection::vec((0_i64..3, 0_i64..3, 0_i64..3), 1..6),
    ) {
        let keys: Vec<String> = (0..values.len()).map(|i| format!("raftstore.knob-{i}")).collect();
        let current: Vec<(&str, serde_json::Value)> =
            keys.iter().zip(&values).map(|(k, v)| (k.as_str(), json!(v.0))).collect();
        let source: Vec<(&str, serde_json::Value)> =
            keys.iter().zip(&values).map(|(k, v)| (k.as_str(), json!(v.1))).collect();
        let target: Vec<(&str, serde_json::Value)> =
            keys.iter().zip(&values).map(|(k, v)| (k.as_str(), json!(v.2))).collect();

        let snapshot = ClusterSnapshot::new(SOURCE_VERSION, TARGET_VERSION)
            .with_instance("tikv-0", create_instance(ComponentType::Tikv, &current));
        let source = knowledge(ComponentType::Tikv, &source, SOURCE_VERSION);
        let target = knowledge(ComponentType::Tikv, &target, TARGET_VERSION);
        let input = AnalysisInput::new(&snapshot).with_knowledge(&source, &target);
        let analyzer = Analyzer::new();

        let first = analyzer.analyze(&input).unwrap().to_json().unwrap();
        let second = analyzer.analyze(&input).unwrap().to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_forced_change_is_always_high(
        current in proptest::option::of(0_i64..3),
        source in 0_i64..3,
        target in 0_i64..3,
        forced in 0_i64..3,
    ) {
        let key = "sysvar:tidb_enable_knob";
        let state = match current {
            Some(value) => create_instance(ComponentType::Tidb, &[(key, json!(value))]),
            None => ComponentState::new(ComponentType::Tidb, SOURCE_VERSION),
        };
        let snapshot =
            ClusterSnapshot::new(SOURCE_VERSION, TARGET_VERSION).with_instance("tidb-0", state);
        let source = knowledge(ComponentType::Tidb, &[(key, json!(source))], SOURCE_VERSION);
        let target = knowledge(ComponentType::Tidb, &[(key, json!(target))], TARGET_VERSION);
        let catalog = create_forced_catalog(
            ComponentType::Tidb,
            "v8.1.0",
            vec![ForcedChange::new(ParamKind::SystemVariable, "tidb_enable_knob", forced)],
        );

        let result = Analyzer::new()
            .analyze(
                &AnalysisInput::new(&snapshot)
                    .with_knowledge(&source, &target)
                    .with_forced_changes(&catalog),
            )
            .unwrap();

        let differences: Vec<&CheckResult> = result
            .findings_in("upgrade_difference")
            .filter(|f| f.parameter_name == "tidb_enable_knob")
            .collect();
        prop_assert_eq!(differences.len(), 1);
        prop_assert_eq!(differences[0].risk_level, RiskLevel::High);
        prop_assert_eq!(differences[0].forced_value.clone(), Some(Value::Int(forced)));
        prop_assert!(!result
            .check_results
            .iter()
            .any(|f| f.is_filtered() && f.parameter_name == "tidb_enable_knob"));
    }

    #[test]
    fn prop_identical_values_are_only_filtered(
        (component, key) in parameter(),
        value in -1_000_000_i64..1_000_000,
    ) {
        let params = [(key, json!(value))];
        let snapshot = ClusterSnapshot::new(SOURCE_VERSION, TARGET_VERSION)
            .with_instance(format!("{component}-0"), create_instance(component, &params));
        let source = knowledge(component, &params, SOURCE_VERSION);
        let target = knowledge(component, &params, TARGET_VERSION);

        let result = Analyzer::new()
            .analyze(&AnalysisInput::new(&snapshot).with_knowledge(&source, &target))
            .unwrap();

        prop_assert_eq!(result.check_results.len(), 1);
        prop_assert!(result.check_results[0].is_filtered());
        prop_assert_eq!(result.check_results[0].flat_key(), key);
    }

    #[test]
    fn prop_one_divergent_replica_one_finding(
        replicas in 2_usize..6,
        value in 0_i64..100,
        divergent in 0_usize..6,
    ) {
        let key = "raftstore.apply-pool-size";
        let build = |odd: Option<usize>| {
            (0..replicas).fold(ClusterSnapshot::new(SOURCE_VERSION, TARGET_VERSION), |snapshot, i| {
                let v = if odd == Some(i) { value + 1 } else { value };
                let state = create_instance(ComponentType::Tikv, &[(key, json!(v))]);
                snapshot.with_instance(format!("tikv-{i}"), state)
            })
        };
        let analyzer = Analyzer::new();

        let uniform = build(None);
        let result = analyzer.analyze(&AnalysisInput::new(&uniform)).unwrap();
        prop_assert_eq!(result.findings_in("consistency").count(), 0);

        let skewed = build(Some(divergent % replicas));
        let result = analyzer.analyze(&AnalysisInput::new(&skewed)).unwrap();
        let findings: Vec<&CheckResult> = result.findings_in("consistency").collect();
        prop_assert_eq!(findings.len(), 1);
        prop_assert_eq!(result.inconsistencies[&ComponentType::Tikv][key].len(), replicas);
    }

    #[test]
    fn prop_state_follows_comparator(n in -1_000_000_i64..1_000_000) {
        let current = Value::Int(n);
        let text = Value::from(n.to_string());
        prop_assert_eq!(ParamState::of(Some(&current), Some(&text)), ParamState::UseDefault);
        let next = Value::Int(n + 1);
        prop_assert_eq!(ParamState::of(Some(&current), Some(&next)), ParamState::UserSet);
        prop_assert_eq!(ParamState::of(Some(&current), None), ParamState::UserSet);
    }
}
