//! Human-authored parameter notes
//!
//! Optional annotations appended to upgrade-difference findings, each
//! guarded by conditions on the target default and target release.

use crate::compare::values_equal;
use crate::component::{ComponentType, ParamKind};
use crate::value::Value;
use crate::version::ReleaseVersion;
use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conditions under which a note applies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteCondition {
    /// Target default must equal this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_default_value: Option<Value>,
    /// Target release must be at least this version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version_min: Option<String>,
}

/// One parameter's note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterNote {
    /// Text appended to finding details
    pub details_note: String,
    /// Optional guard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<NoteCondition>,
}

impl ParameterNote {
    /// Whether the note applies for this target default and release
    #[must_use]
    pub fn applies(&self, target_default: Option<&Value>, target: Option<ReleaseVersion>) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        if let Some(expected) = &condition.target_default_value {
            if !values_equal(target_default, Some(expected)) {
                return false;
            }
        }
        match condition
            .target_version_min
            .as_deref()
            .map(str::parse::<ReleaseVersion>)
        {
            Some(Ok(min)) => target.is_some_and(|t| t >= min),
            Some(Err(_)) | None => true,
        }
    }
}

/// Notes of one component kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentNotes {
    /// Notes on config parameters
    #[serde(default)]
    pub config: BTreeMap<String, ParameterNote>,
    /// Notes on system variables
    #[serde(default)]
    pub system_variables: BTreeMap<String, ParameterNote>,
}

/// Notes of every component kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterNotes {
    components: BTreeMap<ComponentType, ComponentNotes>,
}

impl ParameterNotes {
    /// Create empty notes
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note
    #[must_use]
    pub fn with_note(
        mut self,
        component: ComponentType,
        kind: ParamKind,
        name: impl Into<String>,
        note: ParameterNote,
    ) -> Self {
        let entry = self.components.entry(component).or_default();
        let table = match kind {
            ParamKind::Config => &mut entry.config,
            ParamKind::SystemVariable => &mut entry.system_variables,
        };
        table.insert(name.into(), note);
        self
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ModelError::Decode`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::decode("parameter notes", e))
    }

    /// Note text for a parameter if one exists and its conditions hold
    #[must_use]
    pub fn note_for(
        &self,
        component: ComponentType,
        kind: ParamKind,
        name: &str,
        target_default: Option<&Value>,
        target: Option<ReleaseVersion>,
    ) -> Option<&str> {
        let notes = self.components.get(&component)?;
        let table = match kind {
            ParamKind::Config => &notes.config,
            ParamKind::SystemVariable => &notes.system_variables,
        };
        table
            .get(name)
            .filter(|note| !note.details_note.is_empty() && note.applies(target_default, target))
            .map(|note| note.details_note.as_str())
    }
}
