//! Upgrade Precheck Model
//!
//! Data model shared by the rule framework and the analyzer: typed parameter
//! values and their comparator, observed cluster state, versioned knowledge
//! bases, the forced-change catalog and the findings an analysis produces.
//!
//! # Core Concepts
//!
//! - [`Value`] / [`ParameterValue`]: tagged union over configuration values
//! - [`values_equal`] / [`format_value`]: type-aware comparator
//! - [`ClusterSnapshot`] / [`ComponentState`]: observed state per instance
//! - [`KnowledgeBase`]: per-release default values
//! - [`ForcedChangeCatalog`]: parameters the upgrade overwrites
//! - [`CheckResult`]: one classified finding
//!
//! # Example
//!
//! ```rust,ignore
//! use precheck_model::prelude::*;
//!
//! let current = Value::from("30s");
//! let default = Value::Duration("30000ms".to_string());
//! assert!(values_equal(Some(&current), Some(&default)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compare;
pub mod component;
mod error;
pub mod finding;
pub mod forced;
pub mod knowledge;
pub mod notes;
pub mod snapshot;
pub mod value;
pub mod version;

pub use compare::{format_three_way, format_value, values_equal, NOT_SET};
pub use component::{flat_key, split_key, sysvar_key, ComponentType, ParamKind, SYSVAR_PREFIX};
pub use error::ModelError;
pub use finding::{CheckResult, RiskLevel, Severity, META_FILTERED};
pub use forced::{select_for_value, ForcedChange, ForcedChangeCatalog, Scope, UpgradeStep};
pub use knowledge::{ComponentDefaults, KnowledgeBase};
pub use notes::{NoteCondition, ParameterNote, ParameterNotes};
pub use snapshot::{ClusterSnapshot, ComponentState};
pub use value::{ParameterValue, Value, ValueType};
pub use version::{ReleaseVersion, UpgradePath, VersionMark};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        format_value, values_equal, CheckResult, ClusterSnapshot, ComponentDefaults,
        ComponentState, ComponentType, ForcedChange, ForcedChangeCatalog, KnowledgeBase,
        ParamKind, ParameterValue, RiskLevel, Severity, UpgradePath, UpgradeStep, Value,
        ValueType,
    };
}
