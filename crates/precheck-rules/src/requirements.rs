//! Data requirements declared by rules
//!
//! The analyzer merges the requirements of every active rule (union of
//! components, logical OR of data kinds) to decide which knowledge-base
//! slices to prepare.

use precheck_model::ComponentType;
use std::collections::BTreeSet;

/// What a rule needs from the snapshot and knowledge bases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRequirements {
    /// Component kinds inspected
    pub components: BTreeSet<ComponentType>,
    /// Configuration-file parameters
    pub need_config: bool,
    /// Session/global variables
    pub need_system_variables: bool,
    /// Every instance rather than one per component kind
    pub need_all_instances: bool,
    /// Source-release defaults
    pub need_source_defaults: bool,
    /// Target-release defaults
    pub need_target_defaults: bool,
    /// Forced-change catalog
    pub need_forced_changes: bool,
}

impl DataRequirements {
    /// Requirements covering the given components and nothing else
    #[must_use]
    pub fn for_components(components: impl IntoIterator<Item = ComponentType>) -> Self {
        Self {
            components: components.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Requirements covering every component kind
    #[inline]
    #[must_use]
    pub fn all_components() -> Self {
        Self::for_components(ComponentType::ALL)
    }

    /// Need config parameters
    #[inline]
    #[must_use]
    pub fn with_config(mut self) -> Self {
        self.need_config = true;
        self
    }

    /// Need system variables
    #[inline]
    #[must_use]
    pub fn with_system_variables(mut self) -> Self {
        self.need_system_variables = true;
        self
    }

    /// Need every instance
    #[inline]
    #[must_use]
    pub fn with_all_instances(mut self) -> Self {
        self.need_all_instances = true;
        self
    }

    /// Need source defaults
    #[inline]
    #[must_use]
    pub fn with_source_defaults(mut self) -> Self {
        self.need_source_defaults = true;
        self
    }

    /// Need target defaults
    #[inline]
    #[must_use]
    pub fn with_target_defaults(mut self) -> Self {
        self.need_target_defaults = true;
        self
    }

    /// Need forced-change catalog
    #[inline]
    #[must_use]
    pub fn with_forced_changes(mut self) -> Self {
        self.need_forced_changes = true;
        self
    }

    /// Fold another rule's requirements into this one
    pub fn merge(&mut self, other: &Self) {
        self.components.extend(other.components.iter().copied());
        self.need_config |= other.need_config;
        self.need_system_variables |= other.need_system_variables;
        self.need_all_instances |= other.need_all_instances;
        self.need_source_defaults |= other.need_source_defaults;
        self.need_target_defaults |= other.need_target_defaults;
        self.need_forced_changes |= other.need_forced_changes;
    }

    /// Merge many requirements
    #[must_use]
    pub fn merged<'a>(all: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut merged = Self::default();
        for requirements in all {
            merged.merge(requirements);
        }
        merged
    }

    /// Whether a component kind is needed
    #[inline]
    #[must_use]
    pub fn needs_component(&self, component: ComponentType) -> bool {
        self.components.contains(&component)
    }

    /// Whether any knowledge-base data is needed
    #[inline]
    #[must_use]
    pub fn needs_defaults(&self) -> bool {
        self.need_source_defaults || self.need_target_defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_union_and_or() {
        let a = DataRequirements::for_components([ComponentType::Tidb])
            .with_system_variables()
            .with_source_defaults();
        let b = DataRequirements::for_components([ComponentType::Tikv])
            .with_config()
            .with_all_instances();

        let merged = DataRequirements::merged([&a, &b]);

        assert!(merged.needs_component(ComponentType::Tidb));
        assert!(merged.needs_component(ComponentType::Tikv));
        assert!(!merged.needs_component(ComponentType::Pd));
        assert!(merged.need_config && merged.need_system_variables);
        assert!(merged.need_all_instances && merged.need_source_defaults);
        assert!(!merged.need_target_defaults && !merged.need_forced_changes);
    }

    #[test]
    fn empty_merge_needs_nothing() {
        let merged = DataRequirements::merged([]);
        assert_eq!(merged, DataRequirements::default());
        assert!(!merged.needs_defaults());
    }
}
