//! Testing utilities for the upgrade precheck workspace
//!
//! Fixture builders for snapshots, knowledge bases and forced-change
//! catalogs, plus tracing setup for tests.

#![allow(missing_docs)]

use precheck_model::{
    split_key, ComponentDefaults, ComponentState, ComponentType, ForcedChange,
    ForcedChangeCatalog, KnowledgeBase, ParamKind, ParameterValue, UpgradeStep, Value, ValueType,
};

pub const SOURCE_VERSION: &str = "v7.5.0";
pub const TARGET_VERSION: &str = "v8.5.0";

/// Install a fmt subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parameter with its type inferred from JSON; `null` is an unset value
pub fn param(raw: serde_json::Value) -> ParameterValue {
    Value::from_json(raw)
        .map_or_else(|| ParameterValue::unset(ValueType::String), ParameterValue::new)
}

/// Instance state; keys prefixed `sysvar:` become system variables
pub fn create_instance(
    component: ComponentType,
    params: &[(&str, serde_json::Value)],
) -> ComponentState {
    params
        .iter()
        .fold(ComponentState::new(component, SOURCE_VERSION), |state, (key, raw)| {
            match split_key(key) {
                (ParamKind::SystemVariable, name) => state.with_variable(name, param(raw.clone())),
                (ParamKind::Config, name) => state.with_config(name, param(raw.clone())),
            }
        })
}

/// Instance state reporting a network address
pub fn create_instance_at(
    component: ComponentType,
    address: &str,
    params: &[(&str, serde_json::Value)],
) -> ComponentState {
    create_instance(component, params).with_status("address", serde_json::json!(address))
}

/// Component defaults; keys prefixed `sysvar:` become system variables
pub fn create_defaults(version: &str, params: &[(&str, serde_json::Value)]) -> ComponentDefaults {
    params
        .iter()
        .fold(ComponentDefaults::new(version), |defaults, (key, raw)| {
            match split_key(key) {
                (ParamKind::SystemVariable, name) => {
                    defaults.with_system_variable(name, param(raw.clone()))
                }
                (ParamKind::Config, name) => defaults.with_config(name, param(raw.clone())),
            }
        })
}

/// Knowledge base with a single component kind
pub fn create_knowledge_base(
    version: &str,
    component: ComponentType,
    params: &[(&str, serde_json::Value)],
) -> KnowledgeBase {
    KnowledgeBase::new().with_component(component, create_defaults(version, params))
}

/// Catalog with one upgrade step for one component kind
pub fn create_forced_catalog(
    component: ComponentType,
    step_version: &str,
    changes: Vec<ForcedChange>,
) -> ForcedChangeCatalog {
    ForcedChangeCatalog::new().with_step(component, UpgradeStep::new(step_version, changes))
}

/// Forced system variable change with a rationale
pub fn create_forced_variable(
    name: &str,
    value: impl Into<Value>,
    description: &str,
) -> ForcedChange {
    ForcedChange::new(ParamKind::SystemVariable, name, value).with_description(description)
}
