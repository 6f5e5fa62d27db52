//! Upgrade Precheck Rules
//!
//! The rule framework and the built-in comparison rules.
//!
//! # Core Concepts
//!
//! - [`FilterPolicy`]: central table of deployment-specific and
//!   resource-dependent parameters
//! - [`Rule`]: named comparison unit with declared [`DataRequirements`]
//! - [`RuleContext`]: shared read-only data handed to every rule
//! - [`RuleSet`]: ordered registry of rules
//!
//! # Built-in Rules
//!
//! | Rule | Category | Finds |
//! |---|---|---|
//! | `USER_MODIFIED_PARAMS` | `user_modified` | values changed from the source default |
//! | `UPGRADE_DIFFERENCES` | `upgrade_difference` | forced changes and default drift |
//! | `CONSISTENCY` | `consistency` | values differing between instances |
//! | `HIGH_RISK_PARAMS` | `high_risk` | listed risky parameters |
//!
//! # Example
//!
//! ```rust,ignore
//! use precheck_rules::prelude::*;
//!
//! let rules = RuleSet::with_defaults();
//! let requirements = rules.requirements();
//! assert!(requirements.need_forced_changes);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod consistency;
pub mod context;
pub mod diff;
pub mod filter;
pub mod high_risk;
pub mod registry;
pub mod requirements;
pub mod rule;
pub mod upgrade_differences;
pub mod user_modified;

pub use consistency::{divergence_risk, ConsistencyRule, CONSISTENCY};
pub use context::{Catalog, Catalogs, ForcedChanges, InstanceGroups, RuleContext, ValueGroup};
pub use filter::{FilterPolicy, FilterReason};
pub use high_risk::{HighRiskParam, HighRiskParams, HighRiskRule, HIGH_RISK_PARAMS};
pub use registry::RuleSet;
pub use requirements::DataRequirements;
pub use rule::{Rule, RuleError};
pub use upgrade_differences::{
    classify, Classification, DriftBehavior, ParamState, UpgradeDifferencesRule,
    UPGRADE_DIFFERENCES,
};
pub use user_modified::{UserModifiedRule, USER_MODIFIED_PARAMS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Catalog, Catalogs, ConsistencyRule, DataRequirements, FilterPolicy, HighRiskParams,
        HighRiskRule, InstanceGroups, Rule, RuleContext, RuleError, RuleSet,
        UpgradeDifferencesRule, UserModifiedRule,
    };
}
