//! Forced-change catalog
//!
//! Upgrade steps that overwrite a parameter during migration regardless of
//! its current value. A forced change always wins over default-drift
//! classification for the same parameter.

use crate::compare::values_equal;
use crate::component::{flat_key, ComponentType, ParamKind};
use crate::finding::Severity;
use crate::value::Value;
use crate::version::{UpgradePath, VersionMark};
use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable scope a forced change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Cluster-wide
    #[default]
    Global,
    /// Per session
    Session,
}

impl Scope {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Session => "session",
        }
    }
}

/// One parameter overwritten by an upgrade step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedChange {
    /// Config parameter or system variable
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ParamKind,
    /// Parameter name
    #[serde(alias = "variable", alias = "parameter", alias = "var_name")]
    pub name: String,
    /// Value written by the upgrade
    #[serde(default, alias = "value")]
    pub forced_value: Option<Value>,
    /// Only applies when the current value equals this (value migration)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_value: Option<Value>,
    /// Variable scope
    #[serde(default)]
    pub scope: Scope,
    /// Human-authored rationale
    #[serde(default, alias = "comment", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always true for upgrade logic
    #[serde(default = "always")]
    pub force: bool,
    /// Extra text appended to finding details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_note: Option<String>,
    /// Replaces the default suggestions when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Overrides the reported severity (never the risk level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_severity: Option<Severity>,
}

fn default_kind() -> ParamKind {
    ParamKind::Config
}

fn always() -> bool {
    true
}

impl ForcedChange {
    /// Create forced change
    #[must_use]
    pub fn new(kind: ParamKind, name: impl Into<String>, forced_value: impl Into<Value>) -> Self {
        Self {
            kind,
            name: name.into(),
            forced_value: Some(forced_value.into()),
            from_value: None,
            scope: Scope::Global,
            description: None,
            force: true,
            details_note: None,
            suggestions: Vec::new(),
            report_severity: None,
        }
    }

    /// Restrict to a prior value
    #[inline]
    #[must_use]
    pub fn with_from_value(mut self, from: impl Into<Value>) -> Self {
        self.from_value = Some(from.into());
        self
    }

    /// Attach rationale
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override reported severity
    #[inline]
    #[must_use]
    pub fn with_report_severity(mut self, severity: Severity) -> Self {
        self.report_severity = Some(severity);
        self
    }

    /// Flat-namespace key
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        flat_key(self.kind, &self.name)
    }
}

/// An upgrade step and the parameters it overwrites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStep {
    /// Bootstrap number or release version
    pub version: VersionMark,
    /// Function/context label
    #[serde(default, alias = "func_name", skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Overwritten parameters
    #[serde(default)]
    pub changes: Vec<ForcedChange>,
}

impl UpgradeStep {
    /// Create step
    #[must_use]
    pub fn new(version: &str, changes: Vec<ForcedChange>) -> Self {
        Self {
            version: VersionMark::parse(version),
            function: None,
            changes,
        }
    }
}

/// Forced changes of every component kind, in catalog order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForcedChangeCatalog {
    components: BTreeMap<ComponentType, Vec<UpgradeStep>>,
}

impl ForcedChangeCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an upgrade step
    #[must_use]
    pub fn with_step(mut self, component: ComponentType, step: UpgradeStep) -> Self {
        self.components.entry(component).or_default().push(step);
        self
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::decode("forced-change catalog", e))
    }

    /// Steps declared for a component
    #[must_use]
    pub fn steps(&self, component: ComponentType) -> &[UpgradeStep] {
        self.components.get(&component).map_or(&[], Vec::as_slice)
    }

    /// In-range changes grouped by flat-namespace key, catalog order kept
    #[must_use]
    pub fn in_range(
        &self,
        component: ComponentType,
        path: &UpgradePath,
    ) -> BTreeMap<String, Vec<&ForcedChange>> {
        let mut grouped: BTreeMap<String, Vec<&ForcedChange>> = BTreeMap::new();
        for step in self.steps(component) {
            if !path.contains(&step.version) {
                continue;
            }
            for change in step.changes.iter().filter(|c| c.force) {
                grouped.entry(change.key()).or_default().push(change);
            }
        }
        grouped
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.values().all(Vec::is_empty)
    }
}

/// Pick the change that applies to a current value
///
/// The first candidate whose `from_value` is absent or matches `current`
/// wins; if none match, the last candidate applies.
#[must_use]
pub fn select_for_value<'a>(
    candidates: &[&'a ForcedChange],
    current: Option<&Value>,
) -> Option<&'a ForcedChange> {
    candidates
        .iter()
        .copied()
        .find(|change| {
            change
                .from_value
                .as_ref()
                .map_or(true, |from| values_equal(Some(from), current))
        })
        .or_else(|| candidates.last().copied())
}
