//! Instance-to-component resolution
//!
//! Snapshot instance names may carry node-address suffixes
//! (`tikv-10-0-0-1-20160`). A resolver folds each instance into its logical
//! component kind so knowledge-base lookups happen per kind while the
//! consistency rule still sees every instance.

use precheck_model::{ClusterSnapshot, ComponentState, ComponentType};
use precheck_rules::InstanceGroups;
use std::collections::{BTreeMap, BTreeSet};

/// Maps one snapshot instance to its component kind
pub trait InstanceResolver: Send + Sync + std::fmt::Debug {
    /// Component kind of an instance, `None` when unknown
    fn resolve(&self, name: &str, state: &ComponentState) -> Option<ComponentType>;
}

/// Heuristic resolver: declared type, then exact name, then longest prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixResolver;

impl PrefixResolver {
    /// Resolve by name alone
    #[must_use]
    pub fn resolve_name(name: &str) -> Option<ComponentType> {
        let lowered = name.to_ascii_lowercase();
        if let Ok(component) = lowered.parse::<ComponentType>() {
            return Some(component);
        }
        ComponentType::ALL
            .into_iter()
            .filter(|component| {
                lowered
                    .strip_prefix(component.as_str())
                    .is_some_and(|rest| rest.starts_with(['-', '_', '.', ':']))
            })
            .max_by_key(|component| component.as_str().len())
    }
}

impl InstanceResolver for PrefixResolver {
    fn resolve(&self, name: &str, state: &ComponentState) -> Option<ComponentType> {
        state.declared_type().or_else(|| Self::resolve_name(name))
    }
}

/// Topology-provided mapping from instance name to component kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitResolver {
    mapping: BTreeMap<String, ComponentType>,
}

impl ExplicitResolver {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an instance
    #[inline]
    #[must_use]
    pub fn with_instance(mut self, name: impl Into<String>, component: ComponentType) -> Self {
        self.mapping.insert(name.into(), component);
        self
    }
}

impl InstanceResolver for ExplicitResolver {
    fn resolve(&self, name: &str, _state: &ComponentState) -> Option<ComponentType> {
        self.mapping.get(name).copied()
    }
}

/// Group snapshot instances of the wanted kinds
///
/// With `all_instances` false only the first instance (by name) of each kind
/// is kept. Unresolvable instances are logged and skipped.
#[must_use]
pub fn group_instances(
    snapshot: &ClusterSnapshot,
    resolver: &dyn InstanceResolver,
    wanted: &BTreeSet<ComponentType>,
    all_instances: bool,
) -> InstanceGroups {
    let mut groups = InstanceGroups::new();
    for (name, state) in &snapshot.components {
        match resolver.resolve(name, state) {
            Some(component) if wanted.contains(&component) => {
                groups.entry(component).or_default().push(name.clone());
            }
            Some(component) => {
                tracing::debug!("Instance {} ({}) not needed by any rule", name, component);
            }
            None => tracing::warn!("Cannot resolve component type of instance {}", name),
        }
    }
    for names in groups.values_mut() {
        names.sort();
        if !all_instances {
            names.truncate(1);
        }
    }
    groups
}
