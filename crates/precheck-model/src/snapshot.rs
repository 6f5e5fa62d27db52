//! Observed cluster state
//!
//! A [`ClusterSnapshot`] is produced by an external collector once per
//! collection cycle and is read-only to the engine.

use crate::component::{split_key, ComponentType, ParamKind};
use crate::value::{ParameterValue, Value};
use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One component instance's observed state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentState {
    /// Declared component kind label, as reported by the collector
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    /// Running release version
    #[serde(default)]
    pub version: String,
    /// Configuration-file parameters
    #[serde(default)]
    pub config: BTreeMap<String, ParameterValue>,
    /// Session/global variables (query-serving component only)
    #[serde(default)]
    pub variables: BTreeMap<String, ParameterValue>,
    /// Free-form runtime status
    #[serde(default)]
    pub status: BTreeMap<String, serde_json::Value>,
}

impl ComponentState {
    /// Create state for a component kind
    #[must_use]
    pub fn new(component_type: ComponentType, version: impl Into<String>) -> Self {
        Self {
            component_type: Some(component_type.as_str().to_string()),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add config parameter
    #[inline]
    #[must_use]
    pub fn with_config(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.config.insert(name.into(), value);
        self
    }

    /// Add system variable
    #[inline]
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Add status entry
    #[inline]
    #[must_use]
    pub fn with_status(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.status.insert(key.into(), value);
        self
    }

    /// Declared kind, if the label is recognised
    #[must_use]
    pub fn declared_type(&self) -> Option<ComponentType> {
        self.component_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Look up a parameter by flat-namespace key
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&ParameterValue> {
        match split_key(key) {
            (ParamKind::SystemVariable, name) => self.variables.get(name),
            (ParamKind::Config, name) => self.config.get(name),
        }
    }

    /// Current value by flat-namespace key
    #[inline]
    #[must_use]
    pub fn current_value(&self, key: &str) -> Option<&Value> {
        self.parameter(key).and_then(ParameterValue::value)
    }

    /// Network address from status, if reported
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.status.get("address").and_then(serde_json::Value::as_str)
    }
}

/// All observed component instances, keyed by instance name
///
/// Instance names may carry node-address suffixes (`tikv-10-0-0-1-20160`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Collection time as reported by the collector
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
    /// Release version currently running
    #[serde(default)]
    pub source_version: String,
    /// Release version being upgraded to
    #[serde(default)]
    pub target_version: String,
    /// Instance name to observed state
    #[serde(default)]
    pub components: BTreeMap<String, ComponentState>,
}

impl ClusterSnapshot {
    /// Create empty snapshot for an upgrade
    #[must_use]
    pub fn new(source_version: impl Into<String>, target_version: impl Into<String>) -> Self {
        Self {
            collected_at: None,
            source_version: source_version.into(),
            target_version: target_version.into(),
            components: BTreeMap::new(),
        }
    }

    /// Add component instance
    #[inline]
    #[must_use]
    pub fn with_instance(mut self, name: impl Into<String>, state: ComponentState) -> Self {
        self.components.insert(name.into(), state);
        self
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::decode("cluster snapshot", e))
    }

    /// Number of instances
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no instance was observed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
