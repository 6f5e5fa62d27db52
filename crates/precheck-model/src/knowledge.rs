//! Versioned default-value catalogs
//!
//! One [`KnowledgeBase`] per release: component kind to its config defaults
//! and system-variable defaults. Produced externally, static for the duration
//! of an analysis.

use crate::component::{split_key, sysvar_key, ComponentType, ParamKind};
use crate::value::ParameterValue;
use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defaults of one component kind at one release
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentDefaults {
    /// Release these defaults belong to
    #[serde(default)]
    pub version: String,
    /// Configuration-file defaults
    #[serde(default)]
    pub config_defaults: BTreeMap<String, ParameterValue>,
    /// System-variable defaults
    #[serde(default)]
    pub system_variables: BTreeMap<String, ParameterValue>,
    /// Schema migration counter (query-serving component)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_version: Option<i64>,
}

impl ComponentDefaults {
    /// Create empty defaults for a release
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add config default
    #[inline]
    #[must_use]
    pub fn with_config(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.config_defaults.insert(name.into(), value);
        self
    }

    /// Add system-variable default
    #[inline]
    #[must_use]
    pub fn with_system_variable(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.system_variables.insert(name.into(), value);
        self
    }

    /// Set bootstrap number
    #[inline]
    #[must_use]
    pub fn with_bootstrap_version(mut self, bootstrap: i64) -> Self {
        self.bootstrap_version = Some(bootstrap);
        self
    }

    /// Look up a default by flat-namespace key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        match split_key(key) {
            (ParamKind::SystemVariable, name) => self.system_variables.get(name),
            (ParamKind::Config, name) => self.config_defaults.get(name),
        }
    }

    /// Flatten into one namespace, system variables under `sysvar:`
    #[must_use]
    pub fn flatten(
        &self,
        include_config: bool,
        include_system_variables: bool,
    ) -> BTreeMap<String, ParameterValue> {
        let mut flat = BTreeMap::new();
        if include_config {
            flat.extend(
                self.config_defaults
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        if include_system_variables {
            flat.extend(
                self.system_variables
                    .iter()
                    .map(|(name, value)| (sysvar_key(name), value.clone())),
            );
        }
        flat
    }
}

/// Defaults of every component kind at one release
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    components: BTreeMap<ComponentType, ComponentDefaults>,
}

impl KnowledgeBase {
    /// Create empty knowledge base
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add component defaults
    #[inline]
    #[must_use]
    pub fn with_component(mut self, component: ComponentType, defaults: ComponentDefaults) -> Self {
        self.components.insert(component, defaults);
        self
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] on malformed input or unknown component
    /// kinds.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::decode("knowledge base", e))
    }

    /// Defaults of one component kind
    #[inline]
    #[must_use]
    pub fn component(&self, component: ComponentType) -> Option<&ComponentDefaults> {
        self.components.get(&component)
    }

    /// Iterate component kinds and their defaults
    pub fn iter(&self) -> impl Iterator<Item = (ComponentType, &ComponentDefaults)> {
        self.components.iter().map(|(kind, defaults)| (*kind, defaults))
    }

    /// Bootstrap number of the query-serving component
    #[must_use]
    pub fn bootstrap_version(&self) -> Option<i64> {
        self.component(ComponentType::Tidb)
            .and_then(|defaults| defaults.bootstrap_version)
    }

    /// Whether no component is described
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
