//! Component kinds and the flat parameter namespace
//!
//! Configuration parameters and session/global variables share one flat
//! namespace inside rule logic; variables carry the [`SYSVAR_PREFIX`].

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix distinguishing system variables from config parameters
pub const SYSVAR_PREFIX: &str = "sysvar:";

/// Logical component kind of a cluster process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ComponentType {
    /// Query-serving layer (SQL front end, owns system variables)
    Tidb,
    /// Metadata/scheduling layer
    Pd,
    /// Storage/replication layer
    Tikv,
    /// Analytical (columnar) layer
    Tiflash,
}

impl ComponentType {
    /// All component kinds in canonical order
    pub const ALL: [Self; 4] = [Self::Tidb, Self::Pd, Self::Tikv, Self::Tiflash];

    /// Canonical lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tidb => "tidb",
            Self::Pd => "pd",
            Self::Tikv => "tikv",
            Self::Tiflash => "tiflash",
        }
    }

    /// Whether this component exposes session/global variables
    #[inline]
    #[must_use]
    pub fn has_system_variables(self) -> bool {
        matches!(self, Self::Tidb)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ModelError::UnknownComponent(s.to_string()))
    }
}

impl TryFrom<String> for ComponentType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentType> for &'static str {
    fn from(value: ComponentType) -> Self {
        value.as_str()
    }
}

/// Whether a parameter lives in the config file or is a runtime variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Configuration-file parameter
    Config,
    /// Session/global system variable
    #[serde(alias = "sysvar", alias = "variable")]
    SystemVariable,
}

impl ParamKind {
    /// Serialized name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::SystemVariable => "system_variable",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the flat-namespace key for a system variable
#[inline]
#[must_use]
pub fn sysvar_key(name: &str) -> String {
    format!("{SYSVAR_PREFIX}{name}")
}

/// Build the flat-namespace key for a parameter of the given kind
#[must_use]
pub fn flat_key(kind: ParamKind, name: &str) -> String {
    match kind {
        ParamKind::Config => name.to_string(),
        ParamKind::SystemVariable => sysvar_key(name),
    }
}

/// Split a flat-namespace key into its kind and display name
#[must_use]
pub fn split_key(key: &str) -> (ParamKind, &str) {
    match key.strip_prefix(SYSVAR_PREFIX) {
        Some(name) => (ParamKind::SystemVariable, name),
        None => (ParamKind::Config, key),
    }
}
