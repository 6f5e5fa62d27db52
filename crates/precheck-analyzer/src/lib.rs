//! Upgrade Precheck Analyzer
//!
//! Assesses the risk of upgrading a cluster by comparing its live
//! configuration against the defaults of the running and target releases
//! and the values the upgrade forces.
//!
//! # Core Concepts
//!
//! - [`Analyzer`]: orchestrates one analysis over borrowed inputs
//! - [`Preprocessor`]: removes deployment-specific and unchanged parameters
//! - [`AnalysisResult`]: ordered findings plus per-component indexes
//! - [`AnalyzerConfig`]: focus parameters, high-risk table, rule selection
//!
//! # Example
//!
//! ```rust,ignore
//! use precheck_analyzer::prelude::*;
//!
//! let snapshot = ClusterSnapshot::from_json(&snapshot_json)?;
//! let source = KnowledgeBase::from_json(&source_json)?;
//! let target = KnowledgeBase::from_json(&target_json)?;
//! let forced = ForcedChangeCatalog::from_json(&forced_json)?;
//!
//! let input = AnalysisInput::new(&snapshot)
//!     .with_knowledge(&source, &target)
//!     .with_forced_changes(&forced);
//! let result = Analyzer::new().analyze(&input)?;
//! println!("{} high-risk findings", result.summary().high_risk);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod preprocessor;
pub mod result;
pub mod topology;

pub use analyzer::{AnalysisInput, Analyzer};
pub use config::{AnalyzerConfig, ConfigFormat, ConsistencyConfig};
pub use error::{AnalyzeError, ConfigError};
pub use preprocessor::{Preprocessed, Preprocessor, SkipReason, PARAMETER_PREPROCESSOR};
pub use result::{
    AnalysisResult, FocusParam, InconsistentNode, ParameterEntry, Summary, RULE_ERROR_CATEGORY,
};
pub use topology::{group_instances, ExplicitResolver, InstanceResolver, PrefixResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AnalysisInput, AnalysisResult, Analyzer, AnalyzerConfig, AnalyzeError, ConfigFormat,
        Summary,
    };
    pub use precheck_model::{
        CheckResult, ClusterSnapshot, ComponentType, ForcedChangeCatalog, KnowledgeBase,
        ParameterNotes, RiskLevel, Severity,
    };
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use precheck_model::{ComponentDefaults, ComponentState, ParameterValue};

    #[test]
    fn json_inputs_end_to_end() {
        let snapshot = ClusterSnapshot::new("v7.5.0", "v8.5.0").with_instance(
            "tikv-10-0-0-1-20160",
            ComponentState::new(ComponentType::Tikv, "v7.5.0")
                .with_config("raftstore.store-pool-size", ParameterValue::new(2_i64)),
        );
        let kb = |value: i64| {
            KnowledgeBase::new().with_component(
                ComponentType::Tikv,
                ComponentDefaults::new("v7.5.0")
                    .with_config("raftstore.store-pool-size", ParameterValue::new(value)),
            )
        };
        let (source, target) = (kb(2), kb(4));

        let result = Analyzer::new()
            .analyze(&AnalysisInput::new(&snapshot).with_knowledge(&source, &target))
            .unwrap();

        let summary = result.summary();
        assert_eq!(summary.medium_risk, 1);
        assert!(result.upgrade_differences[&ComponentType::Tikv]
            .contains_key("raftstore.store-pool-size"));
        assert!(result.to_json().unwrap().contains("\"source_version\": \"v7.5.0\""));
    }
}
